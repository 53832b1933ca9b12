// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every crawl setting has a flag and a LINK_SPIDER_* environment variable.
// Flags win over environment variables, which win over the defaults.
//
// to_strategy() turns the parsed arguments into a validated Strategy.
// =============================================================================

use std::time::Duration;

use clap::Parser;
use link_spider::crawl::{
    Strategy, DEFAULT_CONCURRENCY, DEFAULT_GLOBAL_DEADLINE, DEFAULT_MAX_COUNT,
    DEFAULT_MAX_DEPTH, DEFAULT_REQUEST_TIMEOUT,
};
use link_spider::CrawlError;

#[derive(Parser, Debug)]
#[command(
    name = "link-spider",
    version,
    about = "Crawl a website up to a depth, URL budget and deadline",
    long_about = "link-spider starts at ROOT_URL and follows links breadth-first. \
                  It stops when nothing is left to crawl, when --max-count URLs have been \
                  found, or when --time seconds have passed."
)]
pub struct Cli {
    /// Root URL to start from (the scheme defaults to http://)
    pub root_url: String,

    /// Log every fetch and every discovered URL
    #[arg(short, long, env = "LINK_SPIDER_VERBOSE")]
    pub verbose: bool,

    /// Maximum link-hops from the root (0 = unbounded)
    #[arg(long, env = "LINK_SPIDER_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Maximum number of URLs to collect (0 = unbounded)
    #[arg(long, env = "LINK_SPIDER_MAX_COUNT", default_value_t = DEFAULT_MAX_COUNT)]
    pub max_count: usize,

    /// Pages fetched at the same time
    #[arg(long, env = "LINK_SPIDER_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "LINK_SPIDER_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Whole-crawl time budget in seconds (0 = unbounded)
    #[arg(long, env = "LINK_SPIDER_TIME", default_value_t = DEFAULT_GLOBAL_DEADLINE.as_secs())]
    pub time: u64,

    /// Extra request header, as NAME:VALUE (repeatable)
    #[arg(long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Cookie to send, as NAME=VALUE (repeatable)
    #[arg(long = "cookie", value_name = "NAME=VALUE", value_parser = parse_cookie)]
    pub cookies: Vec<(String, String)>,

    /// Reject invalid TLS certificates
    #[arg(long, env = "LINK_SPIDER_VERIFY_TLS")]
    pub verify_tls: bool,

    /// Only follow links on the root's exact host
    #[arg(long, env = "LINK_SPIDER_SAME_HOST")]
    pub same_host: bool,

    /// Follow links to other domains too
    #[arg(long, env = "LINK_SPIDER_ANY_DOMAIN")]
    pub any_domain: bool,

    /// Print the crawl report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Builds the Strategy these arguments describe.
    pub fn to_strategy(&self) -> Result<Strategy, CrawlError> {
        Strategy::builder()
            .max_depth(self.max_depth)
            .max_count(self.max_count)
            .concurrency(self.concurrency)
            .per_request_timeout(Duration::from_secs(self.timeout))
            .global_deadline(Duration::from_secs(self.time))
            .headers(self.headers.iter().cloned())
            .cookies(self.cookies.iter().cloned())
            .verify_tls(self.verify_tls)
            .same_host_only(self.same_host)
            .same_domain_only(!self.any_domain)
            .build()
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{raw}'"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn parse_cookie(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["link-spider", "example.com"]);
        let strategy = cli.to_strategy().unwrap();
        assert_eq!(strategy, Strategy::default());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_flags_map_onto_strategy() {
        let cli = Cli::parse_from([
            "link-spider",
            "https://example.com",
            "-v",
            "--max-depth",
            "2",
            "--max-count",
            "0",
            "--concurrency",
            "8",
            "--time",
            "0",
            "--header",
            "X-Trace: on",
            "--cookie",
            "session=abc",
            "--same-host",
            "--any-domain",
        ]);
        let strategy = cli.to_strategy().unwrap();

        assert!(cli.verbose);
        assert_eq!(strategy.max_depth(), 2);
        assert_eq!(strategy.max_count(), 0);
        assert_eq!(strategy.concurrency(), 8);
        assert_eq!(strategy.global_deadline(), None);
        assert_eq!(strategy.headers().get("X-Trace").map(String::as_str), Some("on"));
        assert_eq!(strategy.cookies().get("session").map(String::as_str), Some("abc"));
        assert!(strategy.same_host_only());
        assert!(!strategy.same_domain_only());
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        let result = Cli::try_parse_from(["link-spider", "example.com", "--header", "nocolon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_concurrency_fails_validation() {
        let cli = Cli::parse_from(["link-spider", "example.com", "--concurrency", "0"]);
        assert!(cli.to_strategy().is_err());
    }
}
