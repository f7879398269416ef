//! Command-line explorer for FAT12/16 disk images

use std::env;
use std::io::{self, Write};
use std::process;

use fatimg::block::FileBlockDevice;
use fatimg::fat::{BootSector, DosDate, Timestamp, Volume, SECTOR_SIZE};
use fatimg::{logging, BlockDevice, FatError};

fn main() {
    logging::init();

    let args: Vec<String> = env::args().collect();
    let status = match (
        args.get(1).map(String::as_str),
        args.get(2),
        args.get(3).map(String::as_str),
    ) {
        (Some("info"), Some(image), None) => run(cmd_info(image)),
        (Some("ls"), Some(image), path) => run(cmd_ls(image, path.unwrap_or("/"))),
        (Some("cat"), Some(image), Some(path)) => run(cmd_cat(image, path)),
        _ => usage(),
    };
    process::exit(status);
}

fn run(result: Result<(), FatError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err);
            1
        }
    }
}

fn usage() -> i32 {
    eprintln!("usage: fatimg info <image>");
    eprintln!("       fatimg ls   <image> [path]");
    eprintln!("       fatimg cat  <image> <path>");
    2
}

/// Opens the image with the smallest legal sector size to probe the BPB,
/// then reopens it with the sector size the volume actually uses.
fn open_volume(image: &str) -> Result<Volume, FatError> {
    let mut probe = FileBlockDevice::open(image, SECTOR_SIZE)?;
    let mut sector = vec![0u8; SECTOR_SIZE];
    probe.read_block(0, &mut sector)?;
    let boot = BootSector::decode(&sector)?;

    let device = FileBlockDevice::open(image, boot.bytes_per_sector as usize)?;
    Volume::mount(Box::new(device))
}

fn cmd_info(image: &str) -> Result<(), FatError> {
    let volume = open_volume(image)?;
    let boot = volume.boot_sector();
    println!("oem name:            {}", text(&boot.oem_name));
    println!("volume label:        {}", text(&boot.volume_label));
    println!("filesystem type:     {}", text(&boot.fs_type));
    println!("volume id:           {:08X}", boot.volume_id);
    println!("fat:                 {:?}", volume.fat_kind());
    println!("bytes per sector:    {}", boot.bytes_per_sector);
    println!("sectors per cluster: {}", boot.sectors_per_cluster);
    println!("reserved sectors:    {}", boot.reserved_sectors);
    println!("fat copies:          {}", boot.fat_count);
    println!("sectors per fat:     {}", boot.sectors_per_fat);
    println!("root entries:        {}", boot.root_dir_entries);
    println!("total sectors:       {}", boot.total_sectors());
    println!("data clusters:       {}", boot.cluster_count());
    Ok(())
}

fn cmd_ls(image: &str, path: &str) -> Result<(), FatError> {
    let mut volume = open_volume(image)?;
    let dir_cluster = if path == "/" || path.is_empty() {
        0
    } else {
        let entry = volume.lookup(path)?;
        if !entry.is_directory() {
            return Err(FatError::NotADirectory);
        }
        entry.start_cluster
    };

    for entry in volume.read_dir(dir_cluster)? {
        let kind = if entry.is_directory() { 'd' } else { '-' };
        let write = if entry.is_read_only() { '-' } else { 'w' };
        println!(
            "{}{} {:>9} {:19} {}",
            kind,
            write,
            entry.file_size,
            datetime(entry.date, entry.time),
            entry.short_name()
        );
    }
    Ok(())
}

fn cmd_cat(image: &str, path: &str) -> Result<(), FatError> {
    let mut volume = open_volume(image)?;
    let entry = volume.lookup(path)?;
    let data = volume.read_file(&entry)?;
    io::stdout().write_all(&data).map_err(|_| FatError::Io)?;
    Ok(())
}

/// Fixed-width label fields are space padded; render without the padding.
fn text(field: &[u8]) -> String {
    let end = field
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Renders the packed date and time as "YYYY-MM-DD HH:MM:SS", leaving the
/// time off when its field is malformed and the whole string empty for an
/// entry whose date was never written.
fn datetime(date: u16, time: u16) -> String {
    if date == 0 {
        return String::new();
    }
    let date = DosDate::unpack(date);
    let mut out = format!("{:04}-{:02}-{:02}", date.year, date.month, date.day);
    if let Ok(time) = Timestamp::unpack(time) {
        out.push_str(&format!(
            " {:02}:{:02}:{:02}",
            time.hours, time.minutes, time.seconds
        ));
    }
    out
}
