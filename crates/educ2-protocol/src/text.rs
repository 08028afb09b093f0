//! Everything the server writes that isn't generated by the simulation.
//!
//! Terminal clients expect `\r\n`, so every line ends with it. Prompts
//! deliberately have no line ending: the cursor waits after them.

use std::fmt;

/// Sent once, right after a client connects.
pub const BANNER: &str = concat!(
    "\r\n",
    "╔══════════════════════════════════════╗\r\n",
    "║        EDUCATIONAL C2 SIMULATOR      ║\r\n",
    "║     FOR SECURITY RESEARCH ONLY       ║\r\n",
    "╚══════════════════════════════════════╝\r\n",
    "This is a simulation for educational purposes.\r\n",
    "No actual attacks are performed.\r\n",
);

/// Separates the banner from the first login prompt.
pub const BANNER_GAP: &str = "\r\n\r\n";

pub const LOGIN_PROMPT: &str = "login: ";
pub const PASSWORD_PROMPT: &str = "password: ";
pub const COMMAND_PROMPT: &str = "\r\n[EDU-C2]> ";

pub const AUTH_FAILED: &str = "\r\nAuthentication failed\r\n";

pub const HELP: &str = concat!(
    "\r\n",
    "Available Commands:\r\n",
    "  help     - Show this help message\r\n",
    "  methods  - Show available (simulated) methods\r\n",
    "  myinfo   - Show your user information\r\n",
    "  attack   - Simulate an attack (no real traffic)\r\n",
    "  stats    - Show simulation statistics\r\n",
    "  clear    - Clear the screen\r\n",
    "  exit     - Disconnect\r\n",
    "\r\n",
    "This is an educational simulation only.\r\n",
    "No actual network attacks are performed.\r\n",
);

pub const METHODS: &str = concat!(
    "\r\n",
    "Simulated Attack Methods:\r\n",
    "  udp      - Simulated UDP flood\r\n",
    "  tcp      - Simulated TCP flood\r\n",
    "  http     - Simulated HTTP flood\r\n",
    "  ldap     - Simulated LDAP amplification\r\n",
    "\r\n",
    "NOTE: These methods only simulate attacks for educational purposes.\r\n",
    "No actual packets are sent to any target.\r\n",
);

pub const ATTACK_USAGE: &str = concat!(
    "Usage: attack <method> <target> <port> <duration>\r\n",
    "Example: attack udp 1.2.3.4 80 60\r\n",
);

/// ANSI erase-display followed by cursor-home.
pub const CLEAR_SCREEN: &str = "\x1B[2J\x1B[0;0f";

pub const GOODBYE: &str = "Goodbye!\r\n";

/// Greeting sent after a successful login.
pub fn welcome(username: &str) -> String {
    format!("\r\nWelcome {username}!\r\nType \"help\" for available commands\r\n")
}

/// Reply to a command token the server doesn't recognize.
pub fn unknown_command(token: &str) -> String {
    format!("Unknown command: {token}\r\n")
}

/// The `myinfo` reply.
#[derive(Debug, Clone)]
pub struct UserInfoView<'a> {
    pub username: &'a str,
    pub role: &'a str,
    pub remote_address: &'a str,
    pub authenticated: bool,
}

impl fmt::Display for UserInfoView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\r\nUser Information:\r\n\
             \x20 Username: {}\r\n\
             \x20 Role: {}\r\n\
             \x20 Session: {}\r\n\
             \x20 Authenticated: {}\r\n\
             \r\n\
             This is simulated user data for educational purposes.\r\n",
            self.username, self.role, self.remote_address, self.authenticated
        )
    }
}

/// The `stats` reply.
#[derive(Debug, Clone, Copy)]
pub struct StatsView {
    pub active_sessions: usize,
    pub total_users: usize,
    /// Placeholder figure; nothing is counted.
    pub simulated_attacks: u32,
    pub uptime_secs: u64,
}

impl fmt::Display for StatsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\r\nSimulation Statistics:\r\n\
             \x20 Active Sessions: {}\r\n\
             \x20 Total Users: {}\r\n\
             \x20 Simulated Attacks: {}\r\n\
             \x20 Uptime: {} seconds\r\n\
             \r\n\
             All data is simulated for educational purposes.\r\n",
            self.active_sessions,
            self.total_users,
            self.simulated_attacks,
            self.uptime_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_have_no_line_ending() {
        assert!(!LOGIN_PROMPT.ends_with('\n'));
        assert!(!PASSWORD_PROMPT.ends_with('\n'));
        assert!(COMMAND_PROMPT.ends_with("[EDU-C2]> "));
        assert!(COMMAND_PROMPT.starts_with("\r\n"));
    }

    #[test]
    fn test_static_texts_use_crlf_only() {
        for text in [BANNER, HELP, METHODS, ATTACK_USAGE, GOODBYE, AUTH_FAILED] {
            let bare_lf = text
                .char_indices()
                .filter(|&(i, c)| c == '\n' && !text[..i].ends_with('\r'))
                .count();
            assert_eq!(bare_lf, 0, "bare LF in {text:?}");
        }
    }

    #[test]
    fn test_welcome_names_user() {
        let text = welcome("admin");

        assert!(text.contains("Welcome admin!"));
        assert!(text.contains("Type \"help\" for available commands"));
    }

    #[test]
    fn test_unknown_command_exact_text() {
        assert_eq!(unknown_command("foobar"), "Unknown command: foobar\r\n");
    }

    #[test]
    fn test_user_info_view_renders_fields() {
        let view = UserInfoView {
            username: "admin",
            role: "admin",
            remote_address: "127.0.0.1:50000",
            authenticated: true,
        };

        let text = view.to_string();
        assert!(text.contains("  Username: admin\r\n"));
        assert!(text.contains("  Role: admin\r\n"));
        assert!(text.contains("  Session: 127.0.0.1:50000\r\n"));
        assert!(text.contains("  Authenticated: true\r\n"));
    }

    #[test]
    fn test_stats_view_renders_fields() {
        let view = StatsView {
            active_sessions: 3,
            total_users: 2,
            simulated_attacks: 42,
            uptime_secs: 17,
        };

        let text = view.to_string();
        assert!(text.contains("  Active Sessions: 3\r\n"));
        assert!(text.contains("  Total Users: 2\r\n"));
        assert!(text.contains("  Simulated Attacks: 42\r\n"));
        assert!(text.contains("  Uptime: 17 seconds\r\n"));
    }
}
