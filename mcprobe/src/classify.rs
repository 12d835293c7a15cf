//! Display helpers: software labels and MOTD flattening.

use serde_json::Value;

use crate::BedrockEdition;

const SECTION: char = '§';

/// Server brands recognised in a Java version name, highest precedence first.
const JAVA_BRANDS: [(&str, &str); 5] = [
    ("paper", "Paper"),
    ("purpur", "Purpur"),
    ("spigot", "Spigot"),
    ("bukkit", "Bukkit"),
    ("velocity", "Velocity"),
];

/// Labels the software behind a Java server.
///
/// Returns `None` when the server did not report a version name at all.
#[must_use]
pub fn java_software(version_name: Option<&str>, mod_loader: Option<&'static str>) -> Option<&'static str> {
    let name = version_name.filter(|n| !n.is_empty())?.to_lowercase();
    let brand = JAVA_BRANDS
        .iter()
        .find(|(token, _)| name.contains(token))
        .map(|(_, label)| *label);
    Some(brand.or(mod_loader).unwrap_or("Vanilla"))
}

/// Labels the software behind a Bedrock server from its advertised edition.
#[must_use]
pub const fn bedrock_software(edition: &BedrockEdition) -> &'static str {
    match edition {
        BedrockEdition::PocketEdition => "Bedrock",
        BedrockEdition::EducationEdition => "Education",
        BedrockEdition::Other(_) => "Unknown",
    }
}

/// Flattens a chat component into legacy-formatted text.
///
/// Returns `None` for a null component or one that flattens to nothing.
#[must_use]
pub fn flatten_motd(component: &Value) -> Option<String> {
    let text = flatten(component);
    if text.is_empty() { None } else { Some(text) }
}

fn flatten(component: &Value) -> String {
    match component {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts.iter().map(flatten).collect(),
        Value::Object(map) => match (map.get("text"), map.get("extra")) {
            (Some(Value::String(text)), extra) => {
                let mut out = String::new();
                if let Some(Value::String(color)) = map.get("color") {
                    out.push(SECTION);
                    match color_code(color) {
                        Some(code) => out.push(code),
                        None => out.push_str(color),
                    }
                }
                out.push_str(text);
                if let Some(Value::Array(extra)) = extra {
                    out.extend(extra.iter().map(flatten));
                }
                out
            }
            (_, Some(Value::Array(extra))) => extra.iter().map(flatten).collect(),
            _ => component.to_string(),
        },
        other => other.to_string(),
    }
}

fn color_code(name: &str) -> Option<char> {
    Some(match name {
        "black" => '0',
        "dark_blue" => '1',
        "dark_green" => '2',
        "dark_aqua" => '3',
        "dark_red" => '4',
        "dark_purple" => '5',
        "gold" => '6',
        "gray" => '7',
        "dark_gray" => '8',
        "blue" => '9',
        "green" => 'a',
        "aqua" => 'b',
        "red" => 'c',
        "light_purple" => 'd',
        "yellow" => 'e',
        "white" => 'f',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_java_software_precedence() {
        assert_eq!(java_software(Some("Paper 1.20.4"), None), Some("Paper"));
        assert_eq!(java_software(Some("Purpur 1.20"), None), Some("Purpur"));
        assert_eq!(java_software(Some("PaperSpigot 1.8.8"), None), Some("Paper"));
        assert_eq!(java_software(Some("CraftBukkit 1.12"), None), Some("Bukkit"));
        assert_eq!(java_software(Some("Velocity 3.3.0"), None), Some("Velocity"));
        assert_eq!(java_software(Some("Spigot 1.20"), Some("Forge")), Some("Spigot"));
    }

    #[test]
    fn test_java_software_fallbacks() {
        assert_eq!(java_software(Some("1.20.4"), Some("Forge")), Some("Forge"));
        assert_eq!(java_software(Some("1.20.4"), Some("Fabric")), Some("Fabric"));
        assert_eq!(java_software(Some("1.20.4"), None), Some("Vanilla"));
        assert_eq!(java_software(Some(""), None), None);
        assert_eq!(java_software(None, Some("Forge")), None);
    }

    #[test]
    fn test_bedrock_software() {
        assert_eq!(bedrock_software(&BedrockEdition::PocketEdition), "Bedrock");
        assert_eq!(bedrock_software(&BedrockEdition::EducationEdition), "Education");
        assert_eq!(bedrock_software(&BedrockEdition::Other("X".into())), "Unknown");
    }

    #[test]
    fn test_flatten_plain_string() {
        assert_eq!(flatten_motd(&json!("A Minecraft Server")).as_deref(), Some("A Minecraft Server"));
        assert_eq!(flatten_motd(&json!("")), None);
        assert_eq!(flatten_motd(&Value::Null), None);
    }

    #[test]
    fn test_flatten_text_with_color() {
        let motd = json!({"text": "Hi", "color": "red"});
        assert_eq!(flatten_motd(&motd).as_deref(), Some("§cHi"));
        let hex = json!({"text": "Hi", "color": "#ff0000"});
        assert_eq!(flatten_motd(&hex).as_deref(), Some("§#ff0000Hi"));
    }

    #[test]
    fn test_flatten_nested_extra_depth_first() {
        let motd = json!({
            "text": "a",
            "extra": [
                {"text": "b", "extra": [{"text": "c"}, "d"]},
                "e",
                [{"text": "f"}, "g"]
            ]
        });
        assert_eq!(flatten_motd(&motd).as_deref(), Some("abcdefg"));
    }

    #[test]
    fn test_flatten_array_and_extra_only() {
        assert_eq!(flatten_motd(&json!(["x", {"text": "y"}])).as_deref(), Some("xy"));
        assert_eq!(flatten_motd(&json!({"extra": ["p", "q"]})).as_deref(), Some("pq"));
    }

    #[test]
    fn test_flatten_non_string_text_uses_extra() {
        assert_eq!(
            flatten_motd(&json!({"text": 7, "extra": [{"text": "A", "color": "red"}, "b"]})).as_deref(),
            Some("§cAb")
        );
        assert_eq!(
            flatten_motd(&json!({"text": null, "extra": ["c"]})).as_deref(),
            Some("c")
        );
    }

    #[test]
    fn test_flatten_fallback_to_json() {
        assert_eq!(
            flatten_motd(&json!({"translate": "k"})).as_deref(),
            Some(r#"{"translate":"k"}"#)
        );
        assert_eq!(flatten_motd(&json!(5)).as_deref(), Some("5"));
    }
}
