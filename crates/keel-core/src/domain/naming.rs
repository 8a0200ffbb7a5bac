//! Naming conventions that map request segments to registry keys.
//!
//! | input        | action key         | view name   |
//! |--------------|--------------------|-------------|
//! | `show`       | `actionShow`       | `show`      |
//! | `read-more`  | `actionReadMore`   | `readMore`  |
//! | `readMore`   | `actionReadMore`   | `readMore`  |

/// Upper-case the first character of every whitespace-separated word and
/// drop the whitespace: `read more` → `ReadMore`.
fn studly(words: &str) -> String {
    words
        .split_whitespace()
        .map(upper_first)
        .collect::<Vec<_>>()
        .concat()
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `read-more` → `ReadMore`.
pub fn dashes_to_studly(name: &str) -> String {
    studly(&name.replace('-', " "))
}

/// `read-more` → `readMore`.
pub fn dashes_to_camel(name: &str) -> String {
    lower_first(&dashes_to_studly(name))
}

/// Registry key for an action: `read-more` → `actionReadMore`.
pub fn action_key(action: &str) -> String {
    format!("action{}", dashes_to_studly(action))
}

/// Conventional view name for an action: `read-more` → `readMore`.
pub fn action_view(action: &str) -> String {
    dashes_to_camel(action)
}

/// The spellings under which per-action format lists may be declared:
/// as passed, camel case, and the full action key.
pub fn action_format_keys(action: &str) -> [String; 3] {
    [
        action.to_owned(),
        dashes_to_camel(action),
        action_key(action),
    ]
}

/// Controller identifier: namespace tag + capitalised first segment.
pub fn controller_id(namespace: &str, segment: &str) -> String {
    format!("{namespace}{}", upper_first(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_keys() {
        assert_eq!(action_key("show"), "actionShow");
        assert_eq!(action_key("read-more"), "actionReadMore");
        assert_eq!(action_key("readMore"), "actionReadMore");
        assert_eq!(action_key(" -list- "), "actionList");
    }

    #[test]
    fn view_names() {
        assert_eq!(action_view("show"), "show");
        assert_eq!(action_view("read-more"), "readMore");
        assert_eq!(action_view("Index"), "index");
        assert_eq!(action_view(""), "");
    }

    #[test]
    fn format_key_spellings() {
        assert_eq!(
            action_format_keys("read-more"),
            ["read-more", "readMore", "actionReadMore"]
        );
    }

    #[test]
    fn controller_ids() {
        assert_eq!(controller_id("App_Controller_", "blog"), "App_Controller_Blog");
        assert_eq!(controller_id("App_Controller_", "Blog"), "App_Controller_Blog");
        assert_eq!(controller_id("App_Controller_", ""), "App_Controller_");
    }
}
