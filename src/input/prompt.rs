//! Interactive collection of the plan parameters.
//!
//! Values are requested one at a time, in a fixed order: the numbers of wines, the A, B and C
//! coefficients of every wine, the fixed costs of the premium wines, the resources and finally
//! Big-M. The first value which cannot be parsed ends the collection with an error.
use crate::parameters::Parameters;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use thiserror::Error;

/// A problem reading a value at one of the prompts
#[derive(Debug, Error)]
pub enum InputError {
    /// The response could not be parsed as the expected type
    #[error("Invalid value for {prompt}: '{value}'")]
    Parse {
        /// The prompt which was answered
        prompt: String,
        /// The response as typed
        value: String,
    },
    /// Input ended before all values were read
    #[error("Input ended while waiting for {prompt}")]
    EndOfInput {
        /// The prompt which went unanswered
        prompt: String,
    },
    /// The console could not be read or written
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads plan parameters from a sequence of prompts
pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Create a new [`Prompter`] reading answers from `reader` and writing prompts to `writer`
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Ask for a single value.
    ///
    /// `label` names the value in the prompt and in error messages.
    pub fn read_value<T: FromStr>(&mut self, label: &str) -> Result<T, InputError> {
        write!(self.writer, "  {label}: ")?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(InputError::EndOfInput {
                prompt: label.to_string(),
            });
        }

        let value = line.trim();
        value.parse().map_err(|_| InputError::Parse {
            prompt: label.to_string(),
            value: value.to_string(),
        })
    }

    /// Print a heading before a group of prompts
    fn heading(&mut self, text: impl Display) -> Result<(), InputError> {
        writeln!(self.writer, "\n{text}")?;
        Ok(())
    }

    /// Ask for one value per item, labelling each prompt `name[1]`, `name[2]`, ...
    fn read_vector(&mut self, name: &str, len: usize) -> Result<Vec<f64>, InputError> {
        (1..=len)
            .map(|i| self.read_value(&format!("{name}[{i}]")))
            .collect()
    }

    /// Collect all of the plan parameters
    pub fn collect_parameters(&mut self) -> Result<Parameters, InputError> {
        let num_standard: usize = self.read_value("Number of standard wines")?;
        let num_premium: usize = self.read_value("Number of premium wines")?;
        let num_wines = num_standard + num_premium;
        self.heading(format_args!(
            "Total wines: {num_wines} ({num_standard} standard + {num_premium} premium)"
        ))?;

        self.heading(format_args!(
            "Enter linear revenue coefficients A for {num_wines} wines:"
        ))?;
        let revenue = self.read_vector("A", num_wines)?;

        self.heading(format_args!(
            "Enter quadratic market saturation coefficients B for {num_wines} wines:"
        ))?;
        let saturation = self.read_vector("B", num_wines)?;

        self.heading(format_args!(
            "Enter variable cost coefficients C for {num_wines} wines:"
        ))?;
        let variable_cost = self.read_vector("C", num_wines)?;

        self.heading(format_args!(
            "Enter fixed cost coefficients F for {num_premium} premium wines:"
        ))?;
        let fixed_cost = self.read_vector("F", num_premium)?;

        self.heading("Resources:")?;
        let num_resources: usize = self.read_value("Number of resource types")?;

        self.heading(format_args!(
            "Enter the availability R of {num_resources} resources:"
        ))?;
        let availability = self.read_vector("R", num_resources)?;

        self.heading(format_args!(
            "Enter resource consumption r ({num_resources} resources x {num_wines} wines):"
        ))?;
        let consumption = (1..=num_resources)
            .map(|k| {
                (1..=num_wines)
                    .map(|i| self.read_value(&format!("r[{k}][{i}]")))
                    .collect::<Result<Vec<f64>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.heading("Big-M constant for premium wine constraints:")?;
        let big_m: f64 = self.read_value("M")?;

        Ok(Parameters {
            num_standard,
            num_premium,
            revenue,
            saturation,
            variable_cost,
            fixed_cost,
            availability,
            consumption,
            big_m,
        })
    }
}

/// Collect the plan parameters interactively from the console
pub fn collect_from_console() -> Result<Parameters, InputError> {
    let stdin = io::stdin();
    Prompter::new(stdin.lock(), io::stdout()).collect_parameters()
}
