mod readers;
mod site;
mod util;

pub use readers::{open_bam_reader, open_text_reader, read_id_allowlist};
pub use site::GenomicSite;
pub use util::{handle_error_and_exit, make_odd, Result};
