//! Locale-specific literals recognized and emitted by the order machine

use std::fmt;
use std::str::FromStr;

/// Words the machine accepts and the replies it sends.
///
/// Recognized words are compared against lowercased input, so they must be
/// lowercase themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phrasebook {
    pub start_command: &'static str,
    pub sizes: &'static [&'static str],
    pub payment_methods: &'static [&'static str],
    pub approval: &'static str,
    pub ask_size: &'static str,
    pub ask_payment: &'static str,
    /// Confirmation prompt; `{size}` and `{payment}` are substituted
    pub confirm_template: &'static str,
    pub thank_you: &'static str,
}

impl Phrasebook {
    pub const ENGLISH: Phrasebook = Phrasebook {
        start_command: "start",
        sizes: &["large", "small"],
        payment_methods: &["cash", "card"],
        approval: "yes",
        ask_size: "which size?",
        ask_payment: "which payment method?",
        confirm_template: "confirm: size={size}, payment={payment}?",
        thank_you: "thank you",
    };

    pub const RUSSIAN: Phrasebook = Phrasebook {
        start_command: "start",
        sizes: &["большую", "маленькую"],
        payment_methods: &["наличкой", "картой"],
        approval: "да",
        ask_size: "Какую пиццу вы хотите? Большую или маленькую?",
        ask_payment: "Как вы будете платить?",
        confirm_template: "Вы хотите {size} пиццу, оплата {payment}?",
        thank_you: "Спасибо за заказ",
    };

    pub fn is_size(&self, word: &str) -> bool {
        self.sizes.contains(&word)
    }

    pub fn is_payment_method(&self, word: &str) -> bool {
        self.payment_methods.contains(&word)
    }

    pub fn confirm(&self, size: &str, payment: &str) -> String {
        self.confirm_template
            .replace("{size}", size)
            .replace("{payment}", payment)
    }
}

impl Default for Phrasebook {
    fn default() -> Self {
        Self::ENGLISH
    }
}

/// Built-in phrasebooks, selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub fn phrasebook(self) -> Phrasebook {
        match self {
            Locale::En => Phrasebook::ENGLISH,
            Locale::Ru => Phrasebook::RUSSIAN,
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ru" => Ok(Locale::Ru),
            other => Err(format!("unknown locale '{other}', expected 'en' or 'ru'")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => f.write_str("en"),
            Locale::Ru => f.write_str("ru"),
        }
    }
}
