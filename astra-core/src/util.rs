/// Write `values` into `out` separated by `separator`, `f` renders each item.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Convert a type or field name into its default table or column name.
///
/// Every uppercase character except the first one is preceded by an underscore,
/// then lowercased: `UserProfile` → `user_profile`, `URL` → `u_r_l`.
pub fn snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 8);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// The last segment of a type path: `my_app::model::User` → `User`.
pub fn simple_type_name(name: &str) -> &str {
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name)
}

/// Comma separated keys, `None` when there are no keys. Used in log lines.
pub fn summarize_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    separated_by(&mut out, keys, |out, v| out.push_str(v), ", ");
    if out.is_empty() {
        out.push_str("None");
    }
    out
}

/// The longest prefix of `value` not exceeding `max` bytes that ends on a char boundary.
pub fn truncate_at(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let end = (0..=max).rev().find(|i| value.is_char_boundary(*i)).unwrap_or(0);
    &value[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncate_at(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_names() {
        assert_eq!(snake_case(""), "");
        assert_eq!(snake_case("URL"), "u_r_l");
        assert_eq!(snake_case("Id"), "id");
        assert_eq!(snake_case("UserProfile"), "user_profile");
        assert_eq!(snake_case("already_snake"), "already_snake");
        assert_eq!(snake_case("createdAt"), "created_at");
    }

    #[test]
    fn simple_names() {
        assert_eq!(simple_type_name("app::model::Invoice"), "Invoice");
        assert_eq!(simple_type_name("Invoice"), "Invoice");
        assert_eq!(simple_type_name("app::Wrapper<app::Inner>"), "Wrapper");
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_at("abc", 5), "abc");
        assert_eq!(truncate_at("abcdef", 3), "abc");
        assert_eq!(truncate_at("aé", 2), "a");
        let long = "x".repeat(600);
        assert_eq!(format!("{}", truncate_long!(long)).len(), 500);
    }

    #[test]
    fn summarize() {
        assert_eq!(summarize_keys([]), "None");
        assert_eq!(summarize_keys(["id", "name"]), "id, name");
    }
}
