use once_cell::sync::Lazy;
use std::collections::HashMap;
use strum::{EnumIter, IntoEnumIterator};

/// Canned prompts answered locally without a backend round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum QuickReply {
    /// Pricing questions
    Pricing,
    /// Technical support requests
    TechnicalSupport,
    /// Anything else
    GeneralInquiry,
}

static BY_PROMPT: Lazy<HashMap<&'static str, QuickReply>> =
    Lazy::new(|| QuickReply::iter().map(|reply| (reply.prompt(), reply)).collect());

impl QuickReply {
    /// Exact, case-sensitive match on the whole submitted text
    pub fn resolve(text: &str) -> Option<QuickReply> {
        BY_PROMPT.get(text).copied()
    }

    /// Prompt text the user submits
    pub fn prompt(self) -> &'static str {
        match self {
            QuickReply::Pricing => "Help with pricing",
            QuickReply::TechnicalSupport => "Technical support",
            QuickReply::GeneralInquiry => "General inquiry",
        }
    }

    /// Assistant reply shown for the prompt
    pub fn reply(self) -> &'static str {
        match self {
            QuickReply::Pricing => {
                "Our pricing plans are flexible and depend on your specific needs. For detailed information, please visit our pricing page or contact support."
            }
            QuickReply::TechnicalSupport => {
                "For technical support, please provide details about the issue you are facing, and our team will assist you shortly."
            }
            QuickReply::GeneralInquiry => {
                "For any general inquiries, feel free to ask here or check our FAQ section on our website."
            }
        }
    }

    /// Function key that drops the prompt into the composer (F1, F2, ...)
    pub fn hotkey(self) -> u8 {
        match self {
            QuickReply::Pricing => 1,
            QuickReply::TechnicalSupport => 2,
            QuickReply::GeneralInquiry => 3,
        }
    }

    pub fn from_hotkey(key: u8) -> Option<QuickReply> {
        QuickReply::iter().find(|reply| reply.hotkey() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_prompt() {
        for reply in QuickReply::iter() {
            assert_eq!(QuickReply::resolve(reply.prompt()), Some(reply));
        }
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        assert_eq!(QuickReply::resolve("help with pricing"), None);
        assert_eq!(QuickReply::resolve("Help with pricing "), None);
        assert_eq!(QuickReply::resolve(" Technical support"), None);
        assert_eq!(QuickReply::resolve("General"), None);
        assert_eq!(QuickReply::resolve(""), None);
    }

    #[test]
    fn hotkeys_round_trip() {
        assert_eq!(QuickReply::from_hotkey(1), Some(QuickReply::Pricing));
        assert_eq!(QuickReply::from_hotkey(3), Some(QuickReply::GeneralInquiry));
        assert_eq!(QuickReply::from_hotkey(4), None);
    }
}
