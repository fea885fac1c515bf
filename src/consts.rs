// read file suffixes
pub const FASTQ: &str = ".fastq";
pub const FASTQ_GZ: &str = ".fastq.gz";

// folder-name prefixes excluded from discovery
pub const ORIGINAL_PREFIX: &str = "original";
pub const ASSEMBLIES_PREFIX: &str = "assemblies";
pub const UNCLASSIFIED_PREFIX: &str = "unclassified";

// working file/dir names inside a read folder
pub const SPLIT_DIR: &str = "split";
pub const FILTERED_FASTQ: &str = "filtered.fastq";
pub const ASSEMBLIES_DIR: &str = "assemblies";
pub const ORIGINAL_BACKUP_DIR: &str = "original_backup";
pub const RACON_SUFFIX: &str = "_racon";
pub const MEDAKA_SUFFIX: &str = "_medaka";

// project-wide names
pub const MEDAKA: &str = "medaka";

/// Environment-name prefix that always wins version resolution.
pub const PRIVILEGED_ENV_PREFIX: &str = "nanoamp_";

/// Environments provisioned by this system itself.
pub const MANAGED_ENVS: &[&str] = &["nanoamp_assmb", "nanoamp_medaka"];

/// Every external binary the pipeline may invoke; resolution is restricted
/// to this set.
pub const REQUIRED_TOOLS: &[&str] = &[
    "duplex-tools",
    "filtlong",
    "flye",
    "raven-assembler",
    "miniasm",
    "minipolish",
    "minimap2",
    "racon",
    "medaka",
];

// model identifier grammar
pub const MODEL_SEPARATOR: char = '_';
pub const VERSION_FIELD_PREFIX: char = 'g';
pub const DEVICE_TOKENS: &[&str] = &["min", "prom"];

/// Sentinel prepended to every selector candidate list.
pub const NO_SELECTION: &str = "--";

// human labels for the model-selector surface (medaka 1.6.1)
pub const PORE_LABELS: &[(&str, &str)] = &[
    ("R9.4.1", "r941"),
    ("R10", "r10"),
    ("R10.3", "r103"),
    ("R10.4", "r104"),
    ("R10.4.1", "r1041"),
];

pub const DEVICE_LABELS: &[(&str, &str)] = &[("MinION", "min"), ("PromethION", "prom")];

pub const GUPPY_LABELS: &[(&str, &str)] = &[
    ("Guppy 3.0.3", "g303"),
    ("Guppy 3.2.2", "g322"),
    ("Guppy 3.2.10", "g3210"),
    ("Guppy 3.3.0", "g330"),
    ("Guppy 3.4.0", "g340"),
    ("Guppy 3.4.4", "g344"),
    ("Guppy 3.4.5", "g345"),
    ("Guppy 3.5.1", "g351"),
    ("Guppy 3.6.0", "g360"),
    ("Guppy 4.0.11", "g4011"),
    ("Guppy 5.0.7", "g507"),
    ("Guppy 5.0.15", "g5015"),
    ("Guppy 5.1.4", "g514"),
    ("Guppy 6.1.0", "g610"),
    ("Guppy 6.1.5", "g615"),
];
