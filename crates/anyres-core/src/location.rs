/// Collapses display names and canonical names of a location to one form:
/// `"West Europe"`, `"westeurope"` and `"WESTEUROPE"` all become `"westeurope"`.
pub fn normalize_location(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Location equality after normalisation.
pub fn same_location(a: &str, b: &str) -> bool {
    normalize_location(a) == normalize_location(b)
}
