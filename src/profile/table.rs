/// Defines a columnar table: one `Vec` per column plus a `length` field, together with a row
/// struct that carries one value per column.
///
/// Every table gets `new`, `with_capacity`, `push`, `row`, `len`, `is_empty` and
/// `is_consistent`, and (de)serializes with camelCase column names.
macro_rules! columnar_table {
    (
        $(#[$meta:meta])*
        pub struct $table:ident => $row:ident {
            $(
                $(#[$col_meta:meta])*
                pub $col:ident: $ty:ty,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $table {
            $(
                $(#[$col_meta])*
                pub $col: Vec<$ty>,
            )*
            /// The number of rows in the table.
            pub length: usize,
        }

        #[doc = concat!("One row of a [`", stringify!($table), "`].")]
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $row {
            $(
                $(#[$col_meta])*
                pub $col: $ty,
            )*
        }

        impl $table {
            /// Creates an empty table.
            pub fn new() -> Self {
                Self::default()
            }

            /// Creates an empty table with room for `capacity` rows in every column.
            pub fn with_capacity(capacity: usize) -> Self {
                Self {
                    $( $col: Vec::with_capacity(capacity), )*
                    length: 0,
                }
            }

            /// Appends a row and returns its index.
            pub fn push(&mut self, row: $row) -> usize {
                let index = self.length;
                $( self.$col.push(row.$col); )*
                self.length += 1;
                index
            }

            /// Returns a copy of the row at `index`.
            ///
            /// Panics if `index` is out of bounds.
            pub fn row(&self, index: usize) -> $row {
                $row {
                    $( $col: self.$col[index].clone(), )*
                }
            }

            /// Returns the number of rows.
            pub fn len(&self) -> usize {
                self.length
            }

            /// Returns `true` if the table has no rows.
            pub fn is_empty(&self) -> bool {
                self.length == 0
            }

            /// Returns `true` if every column holds exactly `length` entries.
            pub fn is_consistent(&self) -> bool {
                true $( && self.$col.len() == self.length )*
            }
        }
    };
}
