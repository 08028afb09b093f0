//! Lines emitted by the simulation.

use educ2_protocol::AttackRequest;

/// Emitted once when the simulation starts.
pub fn starting(request: &AttackRequest) -> String {
    format!(
        "\r\n[SIMULATION] Starting {} attack on {}:{} for {} seconds\r\n\
         [SIMULATION] This is educational - no real attack is occurring\r\n\
         [SIMULATION] Attack would normally send packets here...\r\n",
        request.method, request.target, request.port, request.duration
    )
}

/// Emitted on every tick.
pub fn progress(percent: u8, method: &str) -> String {
    format!("[SIMULATION] Progress: {percent}% - Sending fake {method} packets...\r\n")
}

/// Emitted once after the last tick.
pub const COMPLETED: &str = concat!(
    "[SIMULATION] Attack completed (simulated)\r\n",
    "[SIMULATION] 0 real packets were sent\r\n",
);

/// Reply when a session asks for a second simulation while one runs.
pub fn already_running(percent: u8) -> String {
    format!("[SIMULATION] An attack is already running ({percent}% complete)\r\n")
}
