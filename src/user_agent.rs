// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! Classification of the `User-Agent` header with ordered pattern tables.
//! The first pattern of a table that matches wins, so more specific patterns
//! come before generic ones (Edge before Chrome before Safari).

use lazy_static::lazy_static;
use regex::Regex;

struct Pattern {
    regex: Regex,
    name: &'static str,
}

fn table(entries: &[(&str, &'static str)]) -> Vec<Pattern> {
    entries.iter()
        .map(|(pattern, name)| Pattern {
            regex: Regex::new(&format!("(?i){pattern}")).expect("valid user agent pattern"),
            name,
        })
        .collect()
}

lazy_static! {
    static ref PLATFORMS: Vec<Pattern> = table(&[
        (r"windows nt 10\.0", "Windows 10"),
        (r"windows nt 6\.3", "Windows 8.1"),
        (r"windows nt 6\.2", "Windows 8"),
        (r"windows nt 6\.1", "Windows 7"),
        (r"windows nt 6\.0", "Windows Vista"),
        (r"windows nt 5\.1", "Windows XP"),
        (r"windows", "Unknown Windows OS"),
        (r"android", "Android"),
        (r"iphone|ipad|ipod", "iOS"),
        (r"\bcros\b", "ChromeOS"),
        (r"mac os x|macintosh", "Mac OS X"),
        (r"freebsd", "FreeBSD"),
        (r"openbsd", "OpenBSD"),
        (r"linux", "Linux"),
        (r"sunos", "Sun Solaris"),
    ]);

    /// Browser patterns capture the version in the first group.
    static ref BROWSERS: Vec<Pattern> = table(&[
        (r"edg(?:e|a|ios)?/([\d.]+)", "Edge"),
        (r"(?:opr|opera)[/ ]([\d.]+)", "Opera"),
        (r"samsungbrowser/([\d.]+)", "Samsung Internet"),
        (r"(?:chrome|crios)/([\d.]+)", "Chrome"),
        (r"(?:firefox|fxios)/([\d.]+)", "Firefox"),
        (r"version/([\d.]+).*safari", "Safari"),
        (r"msie ([\d.]+)", "Internet Explorer"),
        (r"trident/.*rv:([\d.]+)", "Internet Explorer"),
        (r"konqueror/([\d.]+)", "Konqueror"),
        (r"lynx/([\d.]+)", "Lynx"),
    ]);

    static ref MOBILES: Vec<Pattern> = table(&[
        (r"iphone", "Apple iPhone"),
        (r"ipad", "iPad"),
        (r"ipod", "Apple iPod Touch"),
        (r"android.*mobile", "Android"),
        (r"android", "Android Tablet"),
        (r"blackberry|bb10", "BlackBerry"),
        (r"windows phone", "Windows Phone"),
        (r"opera mini", "Opera Mini"),
        (r"mobile", "Generic Mobile"),
    ]);

    static ref ROBOTS: Vec<Pattern> = table(&[
        (r"googlebot", "Googlebot"),
        (r"bingbot", "Bing"),
        (r"msnbot", "MSNBot"),
        (r"duckduckbot", "DuckDuckGo"),
        (r"yandex(?:bot)?", "Yandex"),
        (r"baiduspider", "Baidu"),
        (r"slurp", "Inktomi Slurp"),
        (r"facebookexternalhit", "Facebook"),
        (r"twitterbot", "Twitter"),
        (r"applebot", "Applebot"),
        (r"ia_archiver", "Alexa Crawler"),
        (r"curl/", "curl"),
        (r"wget/", "Wget"),
    ]);
}

fn first_match(patterns: &[Pattern], agent: &str) -> Option<&'static str> {
    patterns.iter()
        .find(|pattern| pattern.regex.is_match(agent))
        .map(|pattern| pattern.name)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserAgent {
    agent: String,
    platform: Option<&'static str>,
    browser: Option<&'static str>,
    version: Option<String>,
    mobile: Option<&'static str>,
    robot: Option<&'static str>,
}

impl UserAgent {
    pub fn parse(agent: &str) -> UserAgent {
        let agent = agent.trim();

        let mut result = UserAgent {
            agent: agent.to_owned(),
            platform: first_match(&PLATFORMS, agent),
            ..Default::default()
        };

        if let Some(robot) = first_match(&ROBOTS, agent) {
            result.robot = Some(robot);
            return result;
        }

        for pattern in BROWSERS.iter() {
            if let Some(captures) = pattern.regex.captures(agent) {
                result.browser = Some(pattern.name);
                result.version = captures.get(1).map(|version| version.as_str().to_owned());
                break;
            }
        }

        result.mobile = first_match(&MOBILES, agent);
        result
    }

    pub fn as_str(&self) -> &str {
        &self.agent
    }

    pub fn is_browser(&self) -> bool {
        self.browser.is_some()
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile.is_some()
    }

    pub fn is_robot(&self) -> bool {
        self.robot.is_some()
    }

    pub fn platform(&self) -> Option<&'static str> {
        self.platform
    }

    pub fn browser(&self) -> Option<&'static str> {
        self.browser
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn mobile(&self) -> Option<&'static str> {
        self.mobile
    }

    pub fn robot(&self) -> Option<&'static str> {
        self.robot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        Some("Windows 10"), Some("Chrome"), Some("120.0.0.0")
    )]
    #[case(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.61",
        Some("Windows 10"), Some("Edge"), Some("120.0.2210.61")
    )]
    #[case(
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
        Some("Linux"), Some("Firefox"), Some("121.0")
    )]
    #[case(
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
        Some("Mac OS X"), Some("Safari"), Some("17.1")
    )]
    #[case(
        "Mozilla/5.0 (Windows NT 6.1; Trident/7.0; rv:11.0) like Gecko",
        Some("Windows 7"), Some("Internet Explorer"), Some("11.0")
    )]
    fn test_browsers(#[case] agent: &str, #[case] platform: Option<&str>, #[case] browser: Option<&str>, #[case] version: Option<&str>) {
        let user_agent = UserAgent::parse(agent);
        assert_eq!(user_agent.platform(), platform);
        assert_eq!(user_agent.browser(), browser);
        assert_eq!(user_agent.version(), version);
        assert!(user_agent.is_browser());
        assert!(!user_agent.is_robot());
        assert!(!user_agent.is_mobile());
    }

    #[test]
    fn test_mobile() {
        let user_agent = UserAgent::parse("Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1");
        assert_eq!(user_agent.platform(), Some("iOS"));
        assert_eq!(user_agent.mobile(), Some("Apple iPhone"));
        assert_eq!(user_agent.browser(), Some("Safari"));
        assert!(user_agent.is_mobile());
    }

    #[test]
    fn test_robot() {
        let user_agent = UserAgent::parse("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)");
        assert_eq!(user_agent.robot(), Some("Googlebot"));
        assert!(user_agent.is_robot());
        assert!(!user_agent.is_browser());
    }

    #[test]
    fn test_unknown() {
        let user_agent = UserAgent::parse("  SomethingElse/1.0 ");
        assert_eq!(user_agent.as_str(), "SomethingElse/1.0");
        assert_eq!(user_agent.platform(), None);
        assert!(!user_agent.is_browser() && !user_agent.is_mobile() && !user_agent.is_robot());
    }
}
