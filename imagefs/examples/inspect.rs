use std::env;
use std::fs::File;
use std::process::exit;

use imagefs::io::FileBlockEmulatorBuilder;
use imagefs::Image;

/// Prints the directory and inodes of an existing disk image.
pub fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: inspect disk.img");
        exit(1);
    }

    let disk = File::open(&args[1]).expect("could not open image");
    let dev = FileBlockEmulatorBuilder::from(disk)
        .clear_medium(false)
        .build()
        .expect("could not map image");
    let mut image = Image::open(dev).expect("not a valid image");

    let entries: Vec<(String, u32)> = image.entries().map(|e| (e.name(), e.inum())).collect();
    for (name, inum) in entries {
        let inode = image.inode(inum).expect("dangling directory entry");
        println!(
            "{:>4} {:<28} start = {:>6} len = {}",
            inum,
            name,
            inode.start(),
            inode.len()
        );
    }
    println!(
        "{} free slots, {} free sectors",
        image.free_slots(),
        image.free_map().free_count()
    );
}
