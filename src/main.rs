//! # image-sorter CLI
//!
//! Groups similar images in a folder and sorts them into per-group folders.
//!
//! ## Usage
//! ```bash
//! image-sorter analyze ~/Products --method combined --similarity 0.85
//! image-sorter sort ~/Products --output json
//! ```

mod cli;

use image_sorter::Result;

fn main() -> Result<()> {
    cli::run()
}
