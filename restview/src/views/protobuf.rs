//! Protobuf bodies decoded against the address book `Person` message.

use protowire::{EnumDescriptor, FieldDescriptor, FieldKind, Label, Message, MessageDescriptor};

use crate::artifact::{Artifact, Message as MessageArtifact};
use crate::view::Rendering;
use crate::{Error, Response};

pub static PHONE_TYPE: EnumDescriptor = EnumDescriptor {
    name: "tutorial.Person.PhoneType",
    values: &[("MOBILE", 0), ("HOME", 1), ("WORK", 2)],
};

pub static PHONE_NUMBER: MessageDescriptor = MessageDescriptor {
    name: "tutorial.Person.PhoneNumber",
    fields: &[
        FieldDescriptor::new(1, "number", FieldKind::String, Label::Optional),
        FieldDescriptor::new(2, "type", FieldKind::Enum(&PHONE_TYPE), Label::Optional),
    ],
};

pub static PERSON: MessageDescriptor = MessageDescriptor {
    name: "tutorial.Person",
    fields: &[
        FieldDescriptor::new(1, "name", FieldKind::String, Label::Optional),
        FieldDescriptor::new(2, "id", FieldKind::Int32, Label::Optional),
        FieldDescriptor::new(3, "email", FieldKind::String, Label::Optional),
        FieldDescriptor::new(
            4,
            "phones",
            FieldKind::Message(&PHONE_NUMBER),
            Label::Repeated,
        ),
    ],
};

/// Decode the body as a [`PERSON`] and show it in protobuf text format.
pub fn render_protobuf(response: &Response) -> Result<Rendering, Error> {
    render_message(response, &PERSON)
}

/// Decode the body as a message of the given type and show it in protobuf
/// text format.
pub fn render_message(
    response: &Response,
    descriptor: &'static MessageDescriptor,
) -> Result<Rendering, Error> {
    let message = Message::decode(descriptor, response.body().to_vec())?;
    Ok(Artifact::Message(MessageArtifact {
        type_name: message.type_name().to_string(),
        text: message.to_string(),
    })
    .into())
}
