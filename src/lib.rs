//! Encoder and decoder for ECM containers, which shrink raw CD-ROM images by dropping the
//! sync, EDC and ECC fields every data sector can regenerate.

pub mod cd;
pub mod convert;
pub mod cue;
pub mod ecm;
pub mod error;
