//! dwarfscope - Inspect DWARF debug information in ELF binaries
//!
//! Usage:
//!   dwarfscope <binary> sections        List the debug sections found
//!   dwarfscope <binary> units           List compilation units
//!   dwarfscope <binary> addr <hex>      Find the DIE covering an address
//!   dwarfscope <binary> die <offset>    Show one DIE and its children
//!   dwarfscope <binary> tree            Dump the DIE tree

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dwarfscope_formats::dwarf::{Die, DwarfConfig, DwarfInfo, SECTION_NAMES};
use dwarfscope_formats::{Elf, Section};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dwarfscope", version)]
#[command(about = "Inspect DWARF debug information in ELF binaries", long_about = None)]
struct Cli {
    /// Path to the ELF file
    binary: PathBuf,

    #[command(subcommand)]
    command: Commands,

    /// Build the address index while loading instead of on first lookup
    #[arg(long, global = true)]
    eager: bool,

    /// Ignore DW_AT_sibling and walk every subtree entry by entry
    #[arg(long, global = true)]
    no_sibling_hints: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the debug sections found in the binary
    Sections,
    /// List compilation units
    Units,
    /// Find the innermost DIE whose address range contains an address
    Addr {
        /// Address in hex (0x prefix optional)
        #[arg(value_parser = parse_hex)]
        address: u64,
    },
    /// Show one DIE's attributes and its direct children
    Die {
        /// .debug_info offset in hex (0x prefix optional)
        #[arg(value_parser = parse_hex)]
        offset: u64,
    },
    /// Dump the DIE tree
    Tree {
        /// Only dump the unit with this index
        #[arg(short, long)]
        unit: Option<usize>,
        /// Do not descend below this depth (the unit's root DIE is depth 0)
        #[arg(short, long)]
        depth: Option<usize>,
    },
}

fn parse_hex(s: &str) -> Result<u64, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let data = fs::read(&cli.binary)
        .with_context(|| format!("Failed to read binary: {}", cli.binary.display()))?;
    let elf = Elf::parse(&data).context("Failed to parse ELF file")?;

    if let Commands::Sections = cli.command {
        print_sections(&elf);
        return Ok(());
    }

    let config = DwarfConfig::default()
        .with_eager_index(cli.eager)
        .with_sibling_hints(!cli.no_sibling_hints);
    let dwarf = DwarfInfo::from_provider(&elf, config)
        .context("Failed to read DWARF debug information")?;
    if dwarf.compilation_units().is_empty() {
        bail!("No DWARF debug information found in {}", cli.binary.display());
    }
    log::debug!(
        "{} units in {}, eager index: {}",
        dwarf.compilation_units().len(),
        cli.binary.display(),
        cli.eager
    );

    match cli.command {
        Commands::Sections => {}
        Commands::Units => print_units(&dwarf)?,
        Commands::Addr { address } => print_address(&dwarf, address)?,
        Commands::Die { offset } => print_die(&dwarf, offset)?,
        Commands::Tree { unit, depth } => print_tree(&dwarf, unit, depth)?,
    }

    Ok(())
}

fn print_sections(elf: &Elf) {
    println!("{:<20} {:<10} {:<12} {:<12}", "Name", "Type", "Offset", "Size");
    println!("{}", "-".repeat(57));

    for name in SECTION_NAMES {
        match elf.section_by_name(name) {
            Some(section) => println!(
                "{:<20} {:<10} {:#010x}   {:#010x}",
                name,
                section.type_name(),
                section.sh_offset,
                section.size()
            ),
            None => println!("{:<20} {:<10} {:<12} {:<12}", name, "-", "-", "-"),
        }
    }
}

fn print_units(dwarf: &DwarfInfo) -> Result<()> {
    println!(
        "{:<4} {:<10} {:<4} {:<16} {:<8} {}",
        "Idx", "Offset", "Ver", "Type", "Size", "Name"
    );
    println!("{}", "-".repeat(70));

    dwarf.for_each_compilation_unit(|unit| {
        let header = unit.header();
        let name = unit.name()?.unwrap_or("<unnamed>");
        println!(
            "{:<4} {:#010x} {:<4} {:<16} {:<8} {}",
            unit.index(),
            unit.offset(),
            unit.version(),
            header.unit_type.to_string(),
            unit.size(),
            name
        );
        if let Some(producer) = unit.producer()? {
            println!("     producer: {}", producer);
        }
        Ok(())
    })?;
    Ok(())
}

fn print_address(dwarf: &DwarfInfo, address: u64) -> Result<()> {
    let Some(die) = dwarf.get_die_at_address(address)? else {
        println!("No DIE covers {:#x}", address);
        return Ok(());
    };

    println!("{:#x} is in:", address);
    print_die_line(&die, 1)?;

    // Walk outwards through the enclosing scopes. Scopes without addresses
    // are not indexed, so their parent is found by walking the unit.
    let mut parent = die.parent_offset();
    while let Some(offset) = parent {
        let scope = match dwarf.get_cached_die_at_offset(offset)? {
            Some(scope) => scope,
            None => match dwarf.unit_containing_offset(offset) {
                Some(unit) => match unit.die_with_parent(offset)? {
                    Some(scope) => scope,
                    None => break,
                },
                None => break,
            },
        };
        print_die_line(&scope, 1)?;
        parent = scope.parent_offset();
    }
    Ok(())
}

fn print_die(dwarf: &DwarfInfo, offset: u64) -> Result<()> {
    let Some(die) = dwarf.die_at_offset(offset)? else {
        bail!("No DIE at offset {:#x}", offset);
    };
    if die.is_null() {
        println!("<{:#x}> null entry", offset);
        return Ok(());
    }

    print_die_line(&die, 0)?;
    for attribute in die.attributes()? {
        println!(
            "    {:<24} [{}] {}",
            attribute.name.to_string(),
            attribute.form,
            attribute.value
        );
    }

    let children = die.children()?;
    if !children.is_empty() {
        println!("  children:");
        for child in &children {
            print_die_line(child, 2)?;
        }
    }
    Ok(())
}

fn print_tree(dwarf: &DwarfInfo, only: Option<usize>, max_depth: Option<usize>) -> Result<()> {
    let units = dwarf.compilation_units();
    if let Some(index) = only {
        if index >= units.len() {
            bail!("No unit {} (the binary has {} units)", index, units.len());
        }
    }

    for unit in units {
        if only.is_some_and(|index| index != unit.index()) {
            continue;
        }
        println!(
            "unit {} at {:#x} (DWARF {})",
            unit.index(),
            unit.offset(),
            unit.version()
        );
        if !unit.contains_die_offset(unit.header().first_die_offset()) {
            continue;
        }

        let end = unit.header().end();
        let mut offset = unit.header().first_die_offset();
        let mut depth = 0usize;
        while offset < end {
            let die = unit.die_at(offset)?;
            offset += die.size();

            if die.is_null() {
                if depth <= 1 {
                    break;
                }
                depth -= 1;
                continue;
            }

            print_die_line(&die, depth + 1)?;
            if !die.has_children() {
                if depth == 0 {
                    break;
                }
                continue;
            }
            if max_depth.is_some_and(|max| depth >= max) {
                offset = die.next_sibling_offset()?;
                if depth == 0 {
                    break;
                }
            } else {
                depth += 1;
            }
        }
    }
    Ok(())
}

/// One line per DIE: offset, tag, name and ranges.
fn print_die_line(die: &Die, indent: usize) -> Result<()> {
    let tag = die
        .tag()
        .map(|tag| tag.to_string())
        .unwrap_or_else(|| "null".to_string());
    let mut line = format!("{}<{:#x}> {}", "  ".repeat(indent), die.offset(), tag);
    if let Some(name) = die.name()? {
        line.push_str(&format!(" \"{}\"", name));
    }

    let mut ranges = Vec::new();
    die.for_each_range(|range| ranges.push(range.to_string()))?;
    if !ranges.is_empty() {
        line.push(' ');
        line.push_str(&ranges.join(" "));
    }
    println!("{}", line);
    Ok(())
}
