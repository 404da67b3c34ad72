use std::str::FromStr;

use crate::config::ConfigError;
use crate::domain::geometry::Offset;
use crate::domain::grid::GridSpec;

/// Parses `"COLS,ROWS"` into a grid specification
pub fn parse_grid(input: &str) -> Result<GridSpec, ConfigError> {
    let [cols, rows] = parse_pair::<u32>(input, "2 (cols,rows)")?;
    Ok(GridSpec::new(cols, rows)?)
}

/// Parses `"DX,DY"` into a pixel offset; negative values are allowed
pub fn parse_offset(input: &str) -> Result<Offset, ConfigError> {
    let [dx, dy] = parse_pair::<i32>(input, "2 (dx,dy)")?;
    Ok(Offset::new(dx, dy))
}

pub(crate) fn parse_number<T: FromStr>(value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotANumber {
        value: value.trim().to_string(),
    })
}

fn parse_pair<T: FromStr + Copy>(
    input: &str,
    expected: &'static str,
) -> Result<[T; 2], ConfigError> {
    let values = input
        .split(',')
        .map(parse_number::<T>)
        .collect::<Result<Vec<_>, _>>()?;

    match values.as_slice() {
        [a, b] => Ok([*a, *b]),
        _ => Err(ConfigError::WrongComponentCount {
            input: input.to_string(),
            expected,
            found: values.len(),
        }),
    }
}
