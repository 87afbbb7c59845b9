pub fn verify_token(expected: Option<&str>, presented: &str) -> bool {
    match expected {
        None => true,
        Some(expected) => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
