pub mod assemble;
pub mod cluster;
pub mod cmsearch;
pub mod error;
pub mod hit;
pub mod integron;
pub mod options;
pub mod protein;
pub mod refine;
pub mod replicon;
pub mod report;
pub mod tblout;
