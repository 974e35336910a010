//! This module is where we store constants, like file names or the Minecraft version the
//! mappings are current for.

/// Module where we store information relevant to the Minecraft protocol.
pub mod minecraft {
    pub const VERSION: &str = "1.18.10";
    pub const PROTOCOL_VERSION: u32 = 486;
}

/// Logging messages.
pub mod messages {

    use colored::*;
    use once_cell::sync::Lazy;

    use super::minecraft::VERSION;

    pub static SERVER_STARTING: Lazy<String> = Lazy::new(|| {
        format!("Starting nopal for Minecraft Bedrock {}", VERSION)
            .bold()
            .to_string()
    });

    pub static MAPPINGS_LOADED: Lazy<String> =
        Lazy::new(|| "[ MAPPINGS LOADED ]".bright_green().bold().to_string());

    pub static SERVER_SHUTDOWN_SUCCESS: Lazy<String> =
        Lazy::new(|| "[ SHUT DOWN ]".bright_red().bold().to_string());

    pub static SERVER_SHUTDOWN_ERROR: Lazy<String> =
        Lazy::new(|| "[ SHUT DOWN WITH ERROR ]".bright_red().bold().to_string());

    pub static GREET: Lazy<String> =
        Lazy::new(|| "Hello, world from Nopal!".green().bold().to_string());

    /// Used when exiting with an exit code.
    pub fn server_shutdown_code(code: i32) -> String {
        format!("[ shutdown with code: {code}]")
            .to_uppercase()
            .bright_red()
            .bold()
            .to_string()
    }
}

/// Module used to store file paths relative to the binary.
pub mod file_paths {
    /// Settings file, created with defaults on first run.
    pub const CONFIG: &str = "nopal.json";
}

pub mod directory_paths {
    /// Where the block and item tables are looked up by default.
    pub const DATA: &str = "resources/";
}

/// Names of the vanilla data files. Per-protocol files append a version suffix and an extension.
pub mod resources {
    pub const CANONICAL_BLOCK_STATES: &str = "canonical_block_states";
    pub const R12_TO_CURRENT_BLOCK_MAP: &str = "r12_to_current_block_map";
    pub const BLOCK_ID_MAP: &str = "block_id_map.json";
    pub const REQUIRED_ITEM_LIST: &str = "required_item_list";
}
