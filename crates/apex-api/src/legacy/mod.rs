// Legacy API client modules
//
// Classic firmware has no session login and no config API. Status comes
// from a CGI document in one of two encodings; outputs are switched by
// posting a form keyed on the output's display name.

pub mod models;
pub mod status;

pub use status::LegacyFormat;
