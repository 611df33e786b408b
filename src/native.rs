//! Native diagnostic codes of the fielded-buffer engine.
//!
//! Die Codes folgen der klassischen Ferror/tperrno-Nummerierung der
//! Original-API (Fappend, tpalloc, ...), damit Fehler-Payloads fuer Leser
//! der Original-Doku unmittelbar verstaendlich bleiben. Nur die vom Engine
//! tatsaechlich erzeugten Codes sind definiert.

/// Numeric diagnostic code carried by engine errors.
pub type NativeCode = i32;

/// Buffer is not a fielded buffer (Ferror `FNOTFLD`).
pub const FNOTFLD: NativeCode = 2;

/// No space left in the fielded buffer (Ferror `FNOSPACE`).
///
/// Dies ist das einzige Signal, auf das Grow-and-Retry reagiert. Jeder
/// andere Code ist terminal.
pub const FNOSPACE: NativeCode = 3;

/// Unknown or invalid field identifier (Ferror `FBADFLD`).
pub const FBADFLD: NativeCode = 5;

/// Invalid field type for the operation (Ferror `FTYPERR`).
pub const FTYPERR: NativeCode = 6;

/// Malloc-style allocation refusal (Ferror `FMALLOC`).
pub const FMALLOC: NativeCode = 9;

/// Invalid argument to an allocator call (tperrno `TPEINVAL`).
pub const TPEINVAL: NativeCode = 4;

/// Requested buffer type is not known to the allocator (tperrno `TPENOENT`).
pub const TPENOENT: NativeCode = 6;

/// Returns the symbolic name of a code for log lines and error display.
///
/// `FTYPERR` and `TPENOENT` share the numeric value 6 in the original
/// numbering; the Ferror name wins because the engine raises Ferror-domain
/// codes far more often.
pub fn code_name(code: NativeCode) -> &'static str {
    match code {
        FNOTFLD => "FNOTFLD",
        FNOSPACE => "FNOSPACE",
        TPEINVAL => "TPEINVAL",
        FBADFLD => "FBADFLD",
        FTYPERR => "FTYPERR",
        FMALLOC => "FMALLOC",
        _ => "unknown",
    }
}
