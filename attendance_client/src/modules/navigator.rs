use log::info;

// Moves the user to another page of the attendance site
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str);
}

// Terminal client, so navigating means pointing the user at the page
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, destination: &str) {
        info!("Navigating to {}", destination);
        println!("Attendance records: {}", destination);
    }
}
