use crate::program::Program;
use std::io::Write;
use thiserror::Error;

// =============================================================================
// OUTPUT - tabular / plain rendering of program records
// =============================================================================
//
// Pure rendering: records are written in input order, the bytecode content is
// never inspected.

#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Plain,
}

/// Render isolation programs: `program_id,opcode,op_count,bytecode` rows,
/// with `program_id = <opcode>_<op_count>`.
pub fn write_marginal<W: Write>(
    out: W,
    programs: &[Program],
    format: Format,
) -> Result<(), OutputError> {
    match format {
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["program_id", "opcode", "op_count", "bytecode"])?;
            for program in programs {
                writer.write_record([
                    format!("{}_{}", program.label, program.op_count),
                    program.label.clone(),
                    program.op_count.to_string(),
                    program.bytecode.clone(),
                ])?;
            }
            writer.flush()?;
        }
        Format::Plain => write_plain(out, programs)?,
    }
    Ok(())
}

/// Render randomized programs: `program_id,bytecode` rows, with the input
/// position as `program_id`.
pub fn write_random<W: Write>(
    out: W,
    programs: &[Program],
    format: Format,
) -> Result<(), OutputError> {
    match format {
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["program_id", "bytecode"])?;
            for (index, program) in programs.iter().enumerate() {
                writer.write_record([index.to_string(), program.bytecode.clone()])?;
            }
            writer.flush()?;
        }
        Format::Plain => write_plain(out, programs)?,
    }
    Ok(())
}

fn write_plain<W: Write>(mut out: W, programs: &[Program]) -> Result<(), OutputError> {
    for program in programs {
        writeln!(out, "{}", program.bytecode)?;
    }
    Ok(())
}
