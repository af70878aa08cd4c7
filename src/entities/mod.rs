pub mod address;
pub mod cart;
pub mod comment;
pub mod commodity;
pub mod order;
pub mod user;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let statements = vec![
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(address::Entity),
        schema.create_table_from_entity(commodity::Entity),
        schema.create_table_from_entity(comment::Entity),
        schema.create_table_from_entity(cart::Entity),
        schema.create_table_from_entity(order::Entity),
    ];

    for mut statement in statements {
        statement.if_not_exists();
        db.execute(backend.build(&statement)).await?;
    }

    Ok(())
}
