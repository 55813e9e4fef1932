/// Reads one answer line and reports whether it was a yes.
///
/// `y`/`yes` in any case confirm; anything else, including end of input,
/// declines.
pub fn request_confirmation<R: std::io::BufRead>(mut reader: R) -> std::io::Result<bool> {
    let mut response = String::new();
    reader.read_line(&mut response)?;

    let response = response.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
