use crate::models::User;

pub fn is_blank_query(query: &str) -> bool {
    query.trim().is_empty()
}

/// Case-insensitive substring match on `login`.
///
/// A blank query returns every user in order. The input is never modified.
pub fn filter_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    if is_blank_query(query) {
        return users.iter().collect();
    }

    let needle = query.to_lowercase();
    users
        .iter()
        .filter(|user| user.login.to_lowercase().contains(&needle))
        .collect()
}
