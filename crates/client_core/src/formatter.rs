//! Classification and segmentation of bot replies that list meals.

/// A reply mentioning any of these is rendered as a menu.
pub const MENU_KEYWORDS: [&str; 3] = ["Desayuno", "Almuerzo", "Cena"];
/// Entries mentioning any of these become section titles.
pub const SECTION_TITLE_KEYWORDS: [&str; 4] = ["Desayuno", "Almuerzo", "Cena", "Merienda"];
pub const SECTION_SEPARATOR: &str = "****************";
const ENTRY_DELIMITER: &str = ", ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuSegment {
    Title(String),
    Separator,
    Item(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedMessage {
    PlainText(String),
    Menu(Vec<MenuSegment>),
}

pub fn is_menu(text: &str) -> bool {
    MENU_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

pub fn classify(text: &str) -> FormattedMessage {
    if is_menu(text) {
        FormattedMessage::Menu(segment(text))
    } else {
        FormattedMessage::PlainText(text.to_string())
    }
}

pub fn segment(text: &str) -> Vec<MenuSegment> {
    text.split(ENTRY_DELIMITER)
        .map(|entry| {
            if SECTION_TITLE_KEYWORDS
                .iter()
                .any(|keyword| entry.contains(keyword))
            {
                MenuSegment::Title(entry.to_string())
            } else if entry == SECTION_SEPARATOR {
                MenuSegment::Separator
            } else {
                MenuSegment::Item(entry.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_titles_items_and_separators() {
        assert_eq!(
            segment("Desayuno, pan, ****************, Almuerzo, arroz"),
            vec![
                MenuSegment::Title("Desayuno".to_string()),
                MenuSegment::Item("pan".to_string()),
                MenuSegment::Separator,
                MenuSegment::Title("Almuerzo".to_string()),
                MenuSegment::Item("arroz".to_string()),
            ]
        );
    }

    #[test]
    fn menu_keyword_anywhere_makes_a_menu() {
        assert!(matches!(
            classify("Tu plan: Cena ligera, sopa"),
            FormattedMessage::Menu(_)
        ));
        assert_eq!(
            classify("Hola, ¿en qué te ayudo?"),
            FormattedMessage::PlainText("Hola, ¿en qué te ayudo?".to_string())
        );
    }

    #[test]
    fn merienda_titles_only_inside_menus() {
        assert!(!is_menu("Merienda, fruta"));
        assert_eq!(
            segment("Cena, sopa, Merienda: fruta"),
            vec![
                MenuSegment::Title("Cena".to_string()),
                MenuSegment::Item("sopa".to_string()),
                MenuSegment::Title("Merienda: fruta".to_string()),
            ]
        );
    }

    #[test]
    fn separator_must_match_exactly() {
        assert_eq!(
            segment("Almuerzo, ***, *****************"),
            vec![
                MenuSegment::Title("Almuerzo".to_string()),
                MenuSegment::Item("***".to_string()),
                MenuSegment::Item("*****************".to_string()),
            ]
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert!(!is_menu("desayuno temprano"));
    }

    #[test]
    fn empty_text_is_a_single_empty_item() {
        assert_eq!(segment(""), vec![MenuSegment::Item(String::new())]);
        assert_eq!(classify(""), FormattedMessage::PlainText(String::new()));
    }
}
