use crate::{
    db::key::validate_component,
    error::{Error, ErrorOrigin},
    model::{FieldAccessor, FieldKind},
    traits::Record,
    value::Value,
};

///
/// Shape
///
/// Per-call descriptor of a record type: its table, the primary id field
/// and the set of non-id fields an operation touches.
///
/// With `include_defaults = false` only fields whose value differs from
/// their type's default are kept. That is how a partial update says
/// "only touch these fields" and how a query template says "match only
/// these predicates".
///

#[derive(Debug)]
pub struct Shape<R: Record> {
    primary: &'static FieldAccessor<R>,
    fields: Vec<&'static FieldAccessor<R>>,
}

impl<R: Record> Shape<R> {
    /// Full field set of `R`; values are irrelevant.
    pub fn of() -> Result<Self, Error> {
        let primary = Self::primary_accessor()?;
        let fields = R::FIELDS
            .iter()
            .filter(|field| field.name() != R::PRIMARY_KEY)
            .collect();

        Ok(Self { primary, fields })
    }

    /// Field set of one record instance.
    pub fn derive(record: &R, include_defaults: bool) -> Result<Self, Error> {
        let mut shape = Self::of()?;
        if !include_defaults {
            shape.fields.retain(|field| !field.is_default_in(record));
        }

        Ok(shape)
    }

    fn primary_accessor() -> Result<&'static FieldAccessor<R>, Error> {
        validate_component("table", R::TABLE).map_err(|err| Error::from(err).context(R::TABLE))?;
        for field in R::FIELDS {
            validate_component("field", field.name())?;
        }

        R::field(R::PRIMARY_KEY)
            .filter(|field| field.kind() == FieldKind::Text)
            .ok_or_else(|| Error::no_primary_id(R::TABLE, R::PRIMARY_KEY))
    }

    /// Keep only allowlisted fields; an allowlist naming none of them
    /// leaves the shape untouched.
    #[must_use]
    pub fn restrict(mut self, allow: &[&str]) -> Self {
        if allow.is_empty() {
            return self;
        }

        let kept = self
            .fields
            .iter()
            .copied()
            .filter(|field| allow.contains(&field.name()))
            .collect::<Vec<_>>();
        if !kept.is_empty() {
            self.fields = kept;
        }

        self
    }

    #[must_use]
    pub const fn table(&self) -> &'static str {
        R::TABLE
    }

    #[must_use]
    pub const fn primary(&self) -> &'static FieldAccessor<R> {
        self.primary
    }

    #[must_use]
    pub fn fields(&self) -> &[&'static FieldAccessor<R>] {
        &self.fields
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Populate the primary id field from a lookup key.
    pub(crate) fn assign_id(&self, record: &mut R, id: &str) -> Result<(), Error> {
        self.primary
            .write(record, Value::Text(id.to_string()))
            .map_err(|_| Error::no_primary_id(R::TABLE, R::PRIMARY_KEY))
    }

    /// Decode stored bytes and write them into `field` of `record`.
    pub(crate) fn assign(
        field: &FieldAccessor<R>,
        record: &mut R,
        bytes: &[u8],
    ) -> Result<(), Error> {
        let value = Value::decode(bytes, field.kind())?;
        field.write(record, value).map_err(|value| {
            Error::type_conversion(
                ErrorOrigin::Shape,
                format!(
                    "field '{}' declared {} cannot hold {}",
                    field.name(),
                    field.kind(),
                    value.kind()
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests;
