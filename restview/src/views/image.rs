use crate::artifact::{Artifact, Image};
use crate::view::Rendering;
use crate::{Error, Response};

/// Wrap the body as an image whose format is the content type's subtype.
/// The bytes themselves are not inspected.
pub fn render_image(response: &Response) -> Result<Rendering, Error> {
    let essence = response.essence()?;
    Ok(Artifact::Image(Image {
        format: essence.subtype().to_string(),
        data: response.body().to_vec(),
    })
    .into())
}
