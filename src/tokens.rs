/// Flattens raw argument chunks into one token stream.
///
/// A chunk may hold several whitespace separated tokens, so both
/// `["--dev", "true"]` and `["--dev true"]` produce the same stream. No
/// quoting is interpreted and empty tokens are never produced.
pub fn normalize<I, S>(chunks: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut res = Vec::new();
    for chunk in chunks {
        res.extend(chunk.as_ref().split_whitespace().map(str::to_string));
    }
    res
}
