mod common;
mod recompute;
