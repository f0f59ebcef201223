use crate::artifact::{Artifact, Marker, PointCloud};
use crate::view::Rendering;
use crate::{Error, Response};

/// Render whitespace-delimited point data as a 3-D scatter plot.
///
/// The first non-blank line is a header naming the columns. The first three
/// columns of every following row are taken as x, y and z; any further
/// columns are ignored but must still be numeric.
pub fn render_scatter(response: &Response, point_size: f64) -> Result<Rendering, Error> {
    let text = response.text()?;
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let column_count = match lines.next() {
        Some((_, header)) => header.split_whitespace().count(),
        None => 0,
    };
    if column_count < 3 {
        return Err(Error::TooFewColumns(column_count));
    }

    let mut cloud = PointCloud {
        x: Vec::new(),
        y: Vec::new(),
        z: Vec::new(),
        size: point_size,
        marker: Marker::Sphere,
    };
    for (line_no, line) in lines {
        let values = line
            .split_whitespace()
            .map(|field| {
                field.parse::<f64>().map_err(|e| {
                    Error::Scatter(line_no, format!("invalid number \"{}\": {}", field, e))
                })
            })
            .collect::<Result<Vec<f64>, Error>>()?;
        if values.len() != column_count {
            return Err(Error::Scatter(
                line_no,
                format!("expected {} fields, found {}", column_count, values.len()),
            ));
        }
        cloud.x.push(values[0]);
        cloud.y.push(values[1]);
        cloud.z.push(values[2]);
    }
    Ok(Artifact::PointCloud(cloud).into())
}
