//! User-facing strings in English and German
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Texts for the fate, pool target and dice set rollers
//! - 1.0.0: Notice and roller texts for `en` and `de`

/// Keys of translatable texts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Text {
    NoLongerActive,
    LegacyButton,
    UnknownCommand,
    Unparsable,
    Forbidden,
    Superseded,
    GenericFailure,
    InvalidArgument,
    SyntaxError,
    LimitExceeded,
    EvaluationFailed,
    StateUnreadable,
    RollerCleared,
    ClickToRoll,
    RollAgain,
    Clear,
    Configure,
    Reroll,
    Finish,
    Back,
    Roll,
    Successes,
    Failures,
    Rerolls,
    Glitch,
    Ones,
    ChannelDefaults,
    ChannelDefaultsRemoved,
    Reset,
    EditButtons,
    ClickToAdd,
    PickTarget,
    AskReroll,
    NoReroll,
    Botches,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Language {
    English,
    German,
}

fn language(locale: &str) -> Language {
    if locale.to_ascii_lowercase().starts_with("de") {
        Language::German
    } else {
        Language::English
    }
}

/// Look up `text` for the given Discord locale (e.g. `de`, `en-US`).
///
/// Unknown locales fall back to English.
pub fn tr(locale: &str, text: Text) -> &'static str {
    match language(locale) {
        Language::English => english(text),
        Language::German => german(text),
    }
}

fn english(text: Text) -> &'static str {
    match text {
        Text::NoLongerActive => "This roller is no longer active. Please create a new one.",
        Text::LegacyButton => {
            "This button was created by an older version of the bot. Please re-issue the command."
        }
        Text::UnknownCommand => "This command is not supported anymore.",
        Text::Unparsable => "This button could not be understood.",
        Text::Forbidden => "You are not allowed to do that.",
        Text::Superseded => "The roller changed in the meantime, please try again.",
        Text::GenericFailure => "Something went wrong, please try again later.",
        Text::InvalidArgument => "Invalid input",
        Text::SyntaxError => "Invalid dice expression",
        Text::LimitExceeded => "The dice expression is too large",
        Text::EvaluationFailed => "The dice could not be rolled",
        Text::StateUnreadable => {
            "The stored state of this roller cannot be read. Please re-issue the command."
        }
        Text::RollerCleared => "Roller cleared.",
        Text::ClickToRoll => "Click on a button to roll the dice",
        Text::RollAgain => "Roll again",
        Text::Clear => "Clear",
        Text::Configure => "Configure",
        Text::Reroll => "Reroll",
        Text::Finish => "Finish",
        Text::Back => "Back",
        Text::Roll => "Roll",
        Text::Successes => "Successes",
        Text::Failures => "Failures",
        Text::Rerolls => "Rerolls",
        Text::Glitch => "Glitch!",
        Text::Ones => "Ones",
        Text::ChannelDefaults => "Answer defaults for this channel",
        Text::ChannelDefaultsRemoved => "Channel defaults removed.",
        Text::Reset => "Reset",
        Text::EditButtons => "Edit buttons",
        Text::ClickToAdd => "Click on the buttons to add dice to the set",
        Text::PickTarget => "Click on the target number to roll",
        Text::AskReroll => "Should these values be rerolled",
        Text::NoReroll => "No reroll",
        Text::Botches => "Botches",
    }
}

fn german(text: Text) -> &'static str {
    match text {
        Text::NoLongerActive => "Dieser Würfler ist nicht mehr aktiv. Bitte erstelle einen neuen.",
        Text::LegacyButton => {
            "Dieser Button stammt von einer älteren Bot-Version. Bitte führe den Befehl erneut aus."
        }
        Text::UnknownCommand => "Dieser Befehl wird nicht mehr unterstützt.",
        Text::Unparsable => "Dieser Button konnte nicht verstanden werden.",
        Text::Forbidden => "Das darfst du nicht.",
        Text::Superseded => "Der Würfler wurde zwischenzeitlich geändert, bitte versuche es erneut.",
        Text::GenericFailure => "Etwas ist schiefgelaufen, bitte versuche es später erneut.",
        Text::InvalidArgument => "Ungültige Eingabe",
        Text::SyntaxError => "Ungültiger Würfelausdruck",
        Text::LimitExceeded => "Der Würfelausdruck ist zu groß",
        Text::EvaluationFailed => "Die Würfel konnten nicht geworfen werden",
        Text::StateUnreadable => {
            "Der gespeicherte Zustand dieses Würflers ist unlesbar. Bitte führe den Befehl erneut aus."
        }
        Text::RollerCleared => "Würfler entfernt.",
        Text::ClickToRoll => "Klicke auf einen Button, um zu würfeln",
        Text::RollAgain => "Erneut würfeln",
        Text::Clear => "Entfernen",
        Text::Configure => "Konfigurieren",
        Text::Reroll => "Neu würfeln",
        Text::Finish => "Abschließen",
        Text::Back => "Zurück",
        Text::Roll => "Würfeln",
        Text::Successes => "Erfolge",
        Text::Failures => "Fehlschläge",
        Text::Rerolls => "Neuwürfe",
        Text::Glitch => "Patzer!",
        Text::Ones => "Einsen",
        Text::ChannelDefaults => "Antwort-Voreinstellungen für diesen Kanal",
        Text::ChannelDefaultsRemoved => "Kanal-Voreinstellungen entfernt.",
        Text::Reset => "Zurücksetzen",
        Text::EditButtons => "Buttons bearbeiten",
        Text::ClickToAdd => "Klicke auf die Buttons, um Würfel hinzuzufügen",
        Text::PickTarget => "Klicke auf den Zielwert, um zu würfeln",
        Text::AskReroll => "Sollen diese Werte neu gewürfelt werden",
        Text::NoReroll => "Nicht neu würfeln",
        Text::Botches => "Patzer",
    }
}
