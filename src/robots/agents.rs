//! Crawler agents of interest

/// A crawler the auditor knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile {
    /// robots.txt token
    pub name: &'static str,
    /// Company or project operating the crawler
    pub operator: &'static str,
    /// Published user agent string
    pub user_agent: &'static str,
    /// Collects content for AI training or AI answers
    pub ai: bool,
}

pub const KNOWN_AGENTS: &[AgentProfile] = &[
    AgentProfile {
        name: "GPTBot",
        operator: "OpenAI",
        user_agent: "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; GPTBot/1.1; +https://openai.com/gptbot)",
        ai: true,
    },
    AgentProfile {
        name: "ChatGPT-User",
        operator: "OpenAI",
        user_agent: "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko); compatible; ChatGPT-User/1.0; +https://openai.com/bot",
        ai: true,
    },
    AgentProfile {
        name: "OAI-SearchBot",
        operator: "OpenAI",
        user_agent: "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko); compatible; OAI-SearchBot/1.0; +https://openai.com/searchbot",
        ai: true,
    },
    AgentProfile {
        name: "anthropic-ai",
        operator: "Anthropic",
        user_agent: "anthropic-ai",
        ai: true,
    },
    AgentProfile {
        name: "ClaudeBot",
        operator: "Anthropic",
        user_agent: "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; ClaudeBot/1.0; +claudebot@anthropic.com)",
        ai: true,
    },
    AgentProfile {
        name: "Claude-Web",
        operator: "Anthropic",
        user_agent: "Claude-Web/1.0",
        ai: true,
    },
    AgentProfile {
        name: "CCBot",
        operator: "Common Crawl",
        user_agent: "CCBot/2.0 (https://commoncrawl.org/faq/)",
        ai: true,
    },
    AgentProfile {
        name: "Google-Extended",
        operator: "Google",
        user_agent: "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        ai: true,
    },
    AgentProfile {
        name: "PerplexityBot",
        operator: "Perplexity",
        user_agent: "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; PerplexityBot/1.0; +https://perplexity.ai/perplexitybot)",
        ai: true,
    },
    AgentProfile {
        name: "Bytespider",
        operator: "ByteDance",
        user_agent: "Mozilla/5.0 (Linux; Android 5.0) AppleWebKit/537.36 (KHTML, like Gecko) Mobile Safari/537.36 (compatible; Bytespider; spider-feedback@bytedance.com)",
        ai: true,
    },
    AgentProfile {
        name: "Amazonbot",
        operator: "Amazon",
        user_agent: "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; Amazonbot/0.1; +https://developer.amazon.com/support/amazonbot)",
        ai: true,
    },
    AgentProfile {
        name: "Applebot-Extended",
        operator: "Apple",
        user_agent: "Mozilla/5.0 (compatible; Applebot/0.1; +http://www.apple.com/go/applebot)",
        ai: true,
    },
    AgentProfile {
        name: "FacebookBot",
        operator: "Meta",
        user_agent: "Mozilla/5.0 (compatible; FacebookBot/1.0; +https://developers.facebook.com/docs/sharing/webmasters/facebookbot/)",
        ai: true,
    },
    AgentProfile {
        name: "Meta-ExternalAgent",
        operator: "Meta",
        user_agent: "meta-externalagent/1.1 (+https://developers.facebook.com/docs/sharing/webmasters/crawler)",
        ai: true,
    },
    AgentProfile {
        name: "cohere-ai",
        operator: "Cohere",
        user_agent: "cohere-ai",
        ai: true,
    },
    AgentProfile {
        name: "Diffbot",
        operator: "Diffbot",
        user_agent: "Mozilla/5.0 (compatible; Diffbot/3.0; +http://www.diffbot.com)",
        ai: true,
    },
    AgentProfile {
        name: "YouBot",
        operator: "You.com",
        user_agent: "Mozilla/5.0 (compatible; YouBot (+http://www.you.com))",
        ai: true,
    },
    AgentProfile {
        name: "Googlebot",
        operator: "Google",
        user_agent: "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        ai: false,
    },
    AgentProfile {
        name: "Bingbot",
        operator: "Microsoft",
        user_agent: "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
        ai: false,
    },
];

/// The AI crawlers whose verdicts every audit reports
pub fn ai_agents() -> impl Iterator<Item = &'static AgentProfile> {
    KNOWN_AGENTS.iter().filter(|agent| agent.ai)
}

/// Looks up a known agent by robots.txt token (case-insensitive)
pub fn find_agent(name: &str) -> Option<&'static AgentProfile> {
    KNOWN_AGENTS
        .iter()
        .find(|agent| agent.name.eq_ignore_ascii_case(name))
}

/// Heuristic: does a robots.txt user-agent token name a crawler?
///
/// True when the token contains "bot", "crawler" or "spider", ignoring case.
/// Used to pick up agents declared in a file that are not in the known list.
pub fn is_crawler_name(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    ["bot", "crawler", "spider"]
        .iter()
        .any(|marker| lower.contains(marker))
}
