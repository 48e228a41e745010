use std::error::Error as StdError;

use sqltx_core::{DbError, ErrorCode};

/// The diagnostic tuple of one frame in an error's causal chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    pub sql_state: Option<String>,
    pub driver_code: Option<i64>,
    pub message: String,
}

impl Diagnostics {
    /// Extracts the diagnostics of a single frame.
    ///
    /// Frames that are not a [`DbError`] contribute their display message
    /// only. For a [`DbError`] the fields fill in this order, each source
    /// only writing a still-unset slot:
    ///
    /// 1. the structured info triple;
    /// 2. the frame's own status code — a non-zero numeric code becomes the
    ///    driver code (zero counts as absent), a textual code of at least
    ///    five characters contributes its first five as the SQLSTATE;
    /// 3. the dedicated SQLSTATE accessor, when non-empty.
    pub fn from_frame(frame: &(dyn StdError + 'static)) -> Self {
        let mut sql_state = None;
        let mut driver_code = None;

        if let Some(db) = frame.downcast_ref::<DbError>() {
            if let Some(info) = db.error_info() {
                sql_state = info.sql_state.clone();
                driver_code = info.driver_code;
            }
            match db.code() {
                Some(ErrorCode::Numeric(code)) if *code != 0 && driver_code.is_none() => {
                    driver_code = Some(*code);
                }
                Some(ErrorCode::Text(text)) if sql_state.is_none() && text.chars().count() >= 5 => {
                    sql_state = Some(text.chars().take(5).collect());
                }
                _ => {}
            }
            if sql_state.is_none() {
                if let Some(state) = db.sql_state() {
                    if !state.is_empty() {
                        sql_state = Some(state.to_owned());
                    }
                }
            }
        }

        Self {
            sql_state,
            driver_code,
            message: frame.to_string(),
        }
    }
}
