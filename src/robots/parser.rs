//! Robots.txt directive reader
//!
//! The file is walked once by the robotstxt crate's parser. A handler collects
//! the user-agent tokens, sitemaps and crawl delays it declares. Path decisions
//! go through the crate's matcher over the raw content.

use robotstxt::{parse_robotstxt, DefaultMatcher, RobotsParseHandler};
use std::collections::BTreeMap;

/// Parsed robots.txt content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsDirectives {
    /// Raw content, consulted by the matcher
    content: String,
    /// User-agent tokens as first written, deduplicated case-insensitively
    agents: Vec<String>,
    sitemaps: Vec<String>,
    /// `Crawl-delay:` seconds keyed by the agent spelling in `agents`
    crawl_delays: BTreeMap<String, f64>,
}

/// Collects declarations while the robotstxt parser walks the file
#[derive(Default)]
struct DirectiveCollector {
    agents: Vec<String>,
    sitemaps: Vec<String>,
    crawl_delays: BTreeMap<String, f64>,
    /// Agents of the group being read
    group: Vec<String>,
    /// Set once the current group has seen a rule line
    group_has_rules: bool,
}

impl DirectiveCollector {
    fn mark_rule(&mut self) {
        if !self.group.is_empty() {
            self.group_has_rules = true;
        }
    }

    fn finish(self, content: &str) -> RobotsDirectives {
        RobotsDirectives {
            content: content.to_string(),
            agents: self.agents,
            sitemaps: self.sitemaps,
            crawl_delays: self.crawl_delays,
        }
    }
}

impl RobotsParseHandler for DirectiveCollector {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        // A user-agent line after rules starts a new group
        if self.group_has_rules {
            self.group.clear();
            self.group_has_rules = false;
        }

        let token = user_agent.trim();
        if token.is_empty() {
            return;
        }

        let spelling = match self
            .agents
            .iter()
            .find(|known| known.eq_ignore_ascii_case(token))
        {
            Some(known) => known.clone(),
            None => {
                self.agents.push(token.to_string());
                token.to_string()
            }
        };
        self.group.push(spelling);
    }

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {
        self.mark_rule();
    }

    fn handle_disallow(&mut self, _line_num: u32, _value: &str) {
        self.mark_rule();
    }

    fn handle_sitemap(&mut self, _line_num: u32, value: &str) {
        let url = value.trim();
        if !url.is_empty() {
            self.sitemaps.push(url.to_string());
        }
    }

    fn handle_unknown_action(&mut self, _line_num: u32, action: &str, value: &str) {
        if !action.trim().eq_ignore_ascii_case("crawl-delay") {
            return;
        }
        self.mark_rule();

        if let Ok(delay) = value.trim().parse::<f64>() {
            for agent in &self.group {
                self.crawl_delays.insert(agent.clone(), delay);
            }
        }
    }
}

impl RobotsDirectives {
    /// Parses raw robots.txt content
    ///
    /// Never fails: unrecognized lines are skipped, so arbitrary text parses
    /// to an empty rule set.
    pub fn parse(content: &str) -> Self {
        let mut collector = DirectiveCollector::default();
        parse_robotstxt(content, &mut collector);
        collector.finish(content)
    }

    /// Checks whether `agent` may fetch `path`
    ///
    /// The agent's own group applies when the file has one, otherwise the
    /// wildcard group. Within a group the longest matching pattern wins and
    /// an allow wins a tie.
    pub fn is_allowed(&self, agent: &str, path: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, path)
    }

    /// User-agent tokens in file order, as first written
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// `Sitemap:` URLs in file order
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Declared crawl delays in seconds, by user-agent token
    pub fn crawl_delays(&self) -> &BTreeMap<String, f64> {
        &self.crawl_delays
    }
}
