// Global crawl-policy constants - single source of truth

pub struct Config;

impl Config {
    // Trap detection
    pub const TRAP_THRESHOLD: u32 = 15;

    // Page-quality gates
    pub const MIN_PAGE_TOKENS: usize = 100;
    pub const MAX_CONTENT_LENGTH: u64 = 1_000_000; // 1MB declared-size cutoff

    // Redirect handling
    pub const MAX_REDIRECT_HOPS: u32 = 3;

    // Analytics export
    pub const TOP_WORD_COUNT: usize = 50;

    // Host suffixes considered in-scope for crawling
    pub const ALLOWED_DOMAIN_SUFFIXES: &'static [&'static str] = &[
        ".ics.uci.edu",
        ".cs.uci.edu",
        ".informatics.uci.edu",
        ".stat.uci.edu",
    ];

    // Hosts under this suffix feed the subdomain census
    pub const CENSUS_DOMAIN_SUFFIX: &'static str = ".ics.uci.edu";

    // Hosts excluded outright (gitlab, ML archive, cert)
    pub const EXCLUDED_HOST_PREFIXES: &'static [&'static str] = &[
        "gitlab.ics.uci.edu",
        "archive.ics.uci.edu",
        "www.cert.ics.uci.edu",
    ];

    // Low-value dynamic-doc prefix
    pub const EXCLUDED_PATH_PREFIX: &'static str = "/doku.php";
}
