//! Fixed 256-word mnemonic vocabulary (spec.md §4.1). Order is part of the
//! wire-level contract: changing it invalidates every previously generated
//! phrase, so this list is append-only in spirit even though nothing enforces
//! that mechanically.

pub const WORDLIST: [&str; 256] = [
    "abacus", "anchor", "anvil", "apple", "arrow", "ash", "aspen", "atlas",
    "aurora", "autumn", "badge", "banner", "basin", "beacon", "beam", "bear",
    "beetle", "bell", "birch", "bison", "blaze", "bloom", "bolt", "bone",
    "boulder", "branch", "brass", "breeze", "bridge", "brook", "bronze", "brush",
    "cabin", "cactus", "calm", "camp", "canyon", "cape", "cedar", "chalk",
    "charm", "chess", "chime", "cider", "cinder", "circuit", "clay", "cliff",
    "cloak", "clover", "coal", "cobalt", "comet", "copper", "coral", "cosmos",
    "cotton", "crane", "crater", "creek", "crest", "crown", "crystal", "current",
    "cypress", "dawn", "delta", "desert", "dew", "diamond", "dove", "dragon",
    "drift", "driftwood", "drum", "dune", "dusk", "eagle", "echo", "ember",
    "emerald", "ensign", "ether", "falcon", "feather", "fern", "fiddle", "field",
    "finch", "fiord", "flame", "flax", "flint", "flora", "forest", "forge",
    "fossil", "fox", "frost", "garnet", "gecko", "gem", "glacier", "glade",
    "glass", "gorge", "granite", "grove", "gull", "gully", "hail", "harbor",
    "harp", "hawk", "haven", "hazel", "heron", "hickory", "holly", "honey",
    "horizon", "hornet", "hurdle", "hush", "hyena", "ice", "iris", "island",
    "ivory", "ivy", "jade", "jasper", "jay", "juniper", "kelp", "kettle",
    "kiln", "kite", "lagoon", "lantern", "larch", "lark", "laurel", "ledge",
    "lichen", "lilac", "lily", "linen", "lotus", "lumen", "lynx", "magma",
    "maple", "marble", "marsh", "meadow", "mercury", "meteor", "mica", "mint",
    "mirror", "mist", "moon", "moss", "mulberry", "nebula", "nectar", "needle",
    "nest", "nettle", "nickel", "nimbus", "nomad", "nova", "oak", "oasis",
    "obsidian", "ocean", "olive", "onyx", "opal", "orbit", "orchid", "osprey",
    "otter", "owl", "oxide", "paddle", "palm", "panther", "parsley", "peak",
    "pebble", "pepper", "petal", "pewter", "phoenix", "pine", "plaza", "plum",
    "pollen", "poplar", "prairie", "prism", "quail", "quarry", "quartz", "quill",
    "rain", "raven", "reed", "reef", "relic", "resin", "ridge", "ripple",
    "river", "robin", "rocket", "rose", "ruby", "rune", "sable", "saffron",
    "sage", "sail", "salt", "sapphire", "scarab", "scroll", "sequoia", "shard",
    "shell", "shore", "silk", "silver", "slate", "sliver", "smoke", "snow",
    "sorrel", "spark", "sparrow", "spindle", "spring", "spruce", "star", "stone",
    "storm", "stream", "sun", "swan", "sycamore", "tangerine", "teal", "tern",
];
