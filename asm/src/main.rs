use color_print::cprintln;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about = "Assembler for the MX24 ISA", help_template = HELP_TEMPLATE)]
struct Args {
    /// Source file base names (the `.as` extension is appended)
    input: Vec<String>,

    /// Dump the assembled images and symbol table
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;

    let args = Args::parse();
    if args.input.is_empty() {
        cprintln!("<red,bold>error</>: At least one file base name must be provided");
        std::process::exit(1);
    }

    // Each file is assembled on its own; a failing file never stops the rest.
    for base in &args.input {
        println!("  < {base}{}", mxasm::SRC_EXT);
        if mxasm::assemble(base, args.dump) {
            println!("  > {base}{}", mxasm::OBJ_EXT);
        }
    }
}
