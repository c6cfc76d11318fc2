//! Centralized input limits and validation helpers.

/// Largest molecule text accepted in one request (DOS protection)
pub const MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Largest molecule analyzed in one request
pub const MAX_ATOMS: usize = 1000;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Extensions accepted for uploaded structure files
const KNOWN_EXTENSIONS: [&str; 5] = [".mol", ".sdf", ".smi", ".smarts", ".txt"];

/// Input validation error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Filename too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,
    #[error("Invalid filename: contains path traversal or invalid characters")]
    InvalidFilename,
    #[error("Empty filename provided")]
    EmptyFilename,
    #[error("No molecule provided")]
    EmptyInput,
    #[error("Input is {size} bytes; the limit is {max}")]
    InputTooLarge { size: usize, max: usize },
    #[error("Input contains binary or control characters")]
    InvalidInputContent,
    #[error("Molecule has {atoms} atoms; the limit is {max}")]
    TooManyAtoms { atoms: usize, max: usize },
}

/// Secure filename validation to prevent directory traversal and other attacks
///
/// Rejects traversal sequences and control characters, then keeps only
/// alphanumerics, `.`, `-`, `_` and spaces.
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` if the filename is empty,
/// `ValidationError::FilenameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidFilename` if it contains invalid characters.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    if filename.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFilename);
    }

    let sanitized = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .collect::<String>();

    if sanitized.trim().is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    // Hidden files only when they carry a structure extension
    if sanitized.starts_with('.') && !has_known_extension(&sanitized) {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}

fn has_known_extension(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    KNOWN_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Check molecule text before parsing.
///
/// # Errors
///
/// Returns `ValidationError::EmptyInput` for blank text,
/// `ValidationError::InputTooLarge` past [`MAX_INPUT_BYTES`], and
/// `ValidationError::InvalidInputContent` for control characters other than
/// line breaks and tabs.
pub fn validate_input_text(input: &str) -> Result<(), ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    if input.len() > MAX_INPUT_BYTES {
        return Err(ValidationError::InputTooLarge {
            size: input.len(),
            max: MAX_INPUT_BYTES,
        });
    }
    if input
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Err(ValidationError::InvalidInputContent);
    }
    Ok(())
}

/// Check a parsed molecule's size.
///
/// # Errors
///
/// Returns `ValidationError::TooManyAtoms` past [`MAX_ATOMS`].
pub fn check_atom_limit(atoms: usize) -> Result<(), ValidationError> {
    if atoms > MAX_ATOMS {
        Err(ValidationError::TooManyAtoms {
            atoms,
            max: MAX_ATOMS,
        })
    } else {
        Ok(())
    }
}
