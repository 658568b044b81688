use console::style;

/// Styled terminal output for command results
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Aligned `label: value` line
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<18} {}", style(format!("{}:", label)).dim(), value);
    }

    /// Valid/invalid marker followed by a message
    pub fn status(&self, ok: bool, message: &str) {
        if ok {
            self.success(message);
        } else {
            self.warning(message);
        }
    }

    /// Indented block of free text
    pub fn block(&self, text: &str) {
        for line in text.lines() {
            println!("  {}", line);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
