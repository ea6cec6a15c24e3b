pub fn format_message(message: &str) -> String {
    format!("Echo: {message}")
}
