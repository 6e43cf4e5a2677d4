//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use refresher_core::error::{BuildError, DispenseError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingPumps => {
                "What happened: No pumps were provided to the dispensing engine.\nLikely causes: Pump outputs failed to initialize or were not wired into the builder.\nHow to fix: Ensure the GPIO pins open successfully and are passed via with_pumps(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or recipe CSV.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DispenseError>() {
        return match de {
            DispenseError::ChannelClosed => {
                "What happened: The command channel went away.\nLikely causes: Button node unplugged, serial cable loose, or stdin closed.\nHow to fix: Check the serial wiring (or run interactively with a terminal attached), then restart.".to_string()
            }
            DispenseError::HardwareFault(msg) => format!(
                "What happened: A pump output reported a fault ({msg}).\nLikely causes: Wrong pin numbers in [pins], insufficient GPIO permissions, or a failed motor driver.\nHow to fix: Verify the [pins] values and that the process may access GPIO."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("recipe csv must have headers") {
        return "Invalid headers in recipe CSV. Expected 'name,pump1,pump2,pump3,pump4,water'.".to_string();
    }

    if lower.contains("open serial command source") || lower.contains("serial error") {
        return "What happened: Failed to open the serial device.\nLikely causes: Wrong device path, device busy, or missing permissions.\nHow to fix: Check channel.device in the config (e.g. /dev/serial0) and the process's group membership.".to_string();
    }

    if lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid.\nDetails: {msg}\nHow to fix: Edit the TOML (or recipe CSV) and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map typed errors to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use refresher_core::error::{BuildError, DispenseError};
    if let Some(de) = err.downcast_ref::<DispenseError>() {
        return match de {
            DispenseError::Config(_) => 2,
            DispenseError::ChannelClosed => 3,
            DispenseError::Hardware(_) | DispenseError::HardwareFault(_) => 4,
            DispenseError::Io(_) => 5,
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    use refresher_core::error::{BuildError, DispenseError};
    if let Some(de) = err.downcast_ref::<DispenseError>() {
        return match de {
            DispenseError::Hardware(_) => "Hardware",
            DispenseError::HardwareFault(_) => "HardwareFault",
            DispenseError::Config(_) => "Config",
            DispenseError::ChannelClosed => "ChannelClosed",
            DispenseError::Io(_) => "Io",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "BuildError";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
