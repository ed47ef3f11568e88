#[macro_export]
macro_rules! drop_table {
    ($table:ident, $manager:ident) => {
        $manager
            .drop_table(Table::drop().table($table::Table).to_owned())
            .await?
    };
}

#[macro_export]
macro_rules! drop_index {
    ($name:literal, $table:ident, $manager:ident) => {
        $manager
            .drop_index(Index::drop().name($name).table($table::Table).to_owned())
            .await?
    };
}

pub(crate) use drop_index;
pub(crate) use drop_table;
