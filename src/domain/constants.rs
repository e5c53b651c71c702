//! Source site characteristics and crawl defaults.
//!
//! The structural selectors below are part of the contract with the source
//! site; they must be updated whenever the site's markup changes.

/// Metacritic game browser constants
pub mod site {
    /// Fixed source origin; origin-relative detail links resolve against it
    pub const ORIGIN: &str = "https://www.metacritic.com";

    /// Listing endpoint path
    pub const LISTING_PATH: &str = "/browse/game/";

    /// Query parameter names accepted by the listing endpoint
    pub const PARAM_YEAR_MIN: &str = "releaseYearMin";
    pub const PARAM_YEAR_MAX: &str = "releaseYearMax";
    pub const PARAM_PAGE: &str = "page";

    /// Earliest release year the browser accepts
    pub const DEFAULT_YEAR_MIN: i32 = 1958;
    pub const DEFAULT_YEAR_MAX: i32 = 2025;

    /// Identification header sent with every request
    pub const USER_AGENT: &str = "Mozilla/5.0";

    /// Listing pages use 1-based numbering
    pub const PAGE_NUMBERING_BASE: u32 = 1;
}

/// Structural selectors (CSS) for listing cards and detail pages
pub mod selectors {
    pub const ITEM_CARD: &str = "a.c-finderProductCard_container";
    pub const MUST_PLAY_MARKER: &str = r#"img[alt="must-play"]"#;
    pub const RANK: &str = ".c-finderProductCard_titleHeading span:nth-of-type(1)";
    pub const TITLE: &str = ".c-finderProductCard_titleHeading span:nth-of-type(2)";
    pub const RELEASE_DATE: &str = ".c-finderProductCard_meta span:nth-of-type(1)";
    pub const SCORE: &str = ".c-siteReviewScore span";
    pub const DETAIL_LINK_ATTR: &str = "href";

    /// Label that follows the count on a detail page ("Based on 87 Critic Reviews")
    pub const SUPPLEMENTAL_LABEL: &str = "Critic Reviews";

    /// Release date format on listing cards, e.g. "Jan 02, 2020"
    pub const RELEASE_DATE_FORMAT: &str = "%b %d, %Y";
}

/// Crawl defaults
pub mod crawling {
    pub const DEFAULT_START_PAGE: u32 = 1;
    pub const DEFAULT_END_PAGE: u32 = 16;

    /// Per-fetch timeout (seconds)
    pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;

    /// Base pacing delay; the actual delay is drawn from `[base, base + jitter]`
    pub const DEFAULT_DELAY_MS: u64 = 1000;
    pub const DEFAULT_JITTER_MS: u64 = 1000;

    /// `1` selects the sequential strategy
    pub const DEFAULT_CONCURRENCY: usize = 1;

    /// Output file name pattern (chrono format string)
    pub const OUTPUT_FILE_PATTERN: &str = "metacritic_must_play_%Y-%m-%d.csv";
}
