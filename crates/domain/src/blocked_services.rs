use crate::errors::DomainError;
use crate::schedule::WeeklySchedule;
use serde::{Deserialize, Serialize};

/// One entry of the built-in blocked-services catalogue.
#[derive(Debug, Clone, Copy)]
pub struct ServiceEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub rules: &'static [&'static str],
}

/// Built-in service catalogue. IDs outside this table fail validation.
pub const SERVICE_CATALOGUE: &[ServiceEntry] = &[
    ServiceEntry {
        id: "facebook",
        name: "Facebook",
        rules: &[
            "||facebook.com^",
            "||facebook.net^",
            "||fbcdn.net^",
            "||fb.com^",
            "||fb.gg^",
            "||messenger.com^",
        ],
    },
    ServiceEntry {
        id: "instagram",
        name: "Instagram",
        rules: &["||instagram.com^", "||cdninstagram.com^", "||ig.me^"],
    },
    ServiceEntry {
        id: "tiktok",
        name: "TikTok",
        rules: &[
            "||tiktok.com^",
            "||tiktokcdn.com^",
            "||tiktokv.com^",
            "||musical.ly^",
        ],
    },
    ServiceEntry {
        id: "twitter",
        name: "Twitter (X)",
        rules: &["||twitter.com^", "||twimg.com^", "||x.com^", "||t.co^"],
    },
    ServiceEntry {
        id: "youtube",
        name: "YouTube",
        rules: &[
            "||youtube.com^",
            "||ytimg.com^",
            "||googlevideo.com^",
            "||youtu.be^",
            "||youtube-nocookie.com^",
        ],
    },
    ServiceEntry {
        id: "netflix",
        name: "Netflix",
        rules: &["||netflix.com^", "||nflxvideo.net^", "||nflximg.net^"],
    },
    ServiceEntry {
        id: "twitch",
        name: "Twitch",
        rules: &["||twitch.tv^", "||ttvnw.net^", "||jtvnw.net^"],
    },
    ServiceEntry {
        id: "discord",
        name: "Discord",
        rules: &["||discord.com^", "||discord.gg^", "||discordapp.com^"],
    },
    ServiceEntry {
        id: "reddit",
        name: "Reddit",
        rules: &["||reddit.com^", "||redd.it^", "||redditmedia.com^"],
    },
    ServiceEntry {
        id: "snapchat",
        name: "Snapchat",
        rules: &["||snapchat.com^", "||sc-cdn.net^", "||snap-dev.net^"],
    },
    ServiceEntry {
        id: "whatsapp",
        name: "WhatsApp",
        rules: &["||whatsapp.com^", "||whatsapp.net^", "||wa.me^"],
    },
    ServiceEntry {
        id: "telegram",
        name: "Telegram",
        rules: &["||telegram.org^", "||t.me^", "||telegram.me^"],
    },
    ServiceEntry {
        id: "steam",
        name: "Steam",
        rules: &["||steampowered.com^", "||steamcommunity.com^", "||steamstatic.com^"],
    },
    ServiceEntry {
        id: "spotify",
        name: "Spotify",
        rules: &["||spotify.com^", "||scdn.co^", "||spotifycdn.com^"],
    },
    ServiceEntry {
        id: "ebay",
        name: "eBay",
        rules: &["||ebay.com^", "||ebaystatic.com^", "||ebayimg.com^"],
    },
];

pub fn find_service(id: &str) -> Option<&'static ServiceEntry> {
    SERVICE_CATALOGUE.iter().find(|s| s.id == id)
}

/// Blocked-services configuration: which catalogue entries are blocked and
/// when blocking is paused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedServicesConfig {
    #[serde(default)]
    pub schedule: WeeklySchedule,

    #[serde(default)]
    pub ids: Vec<String>,
}

impl BlockedServicesConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        for id in &self.ids {
            if find_service(id).is_none() {
                return Err(DomainError::UnknownService(id.clone()));
            }
        }
        Ok(())
    }
}
