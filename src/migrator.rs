use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_productos_table::Migration),
            Box::new(m20240101_000003_create_instalaciones_table::Migration),
            Box::new(m20240101_000004_create_descuentos_table::Migration),
            Box::new(m20240101_000005_create_auth_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tecnicos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Tecnicos::IdUnicoTecnico)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Tecnicos::Nombre).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Tecnicos::Apellido)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tecnicos::IdTecnico)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Operadores::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Operadores::IdOpe)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Operadores::NombreOperador)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Dr::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Dr::IdDr)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Dr::NombreDr)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Dr::ValorDr).decimal_len(10, 2).not_null())
                        .col(
                            ColumnDef::new(Dr::ValorDrEmpresa)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Acometidas::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Acometidas::IdAcometida)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Acometidas::NombreAcometida)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Acometidas::Precio)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Tipodeordenes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Tipodeordenes::IdTipoOrden)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Tipodeordenes::NombreOrden)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tipodeordenes::ValorOrden)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tipodeordenes::ValorOrdenEmpresa)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                Tipodeordenes::Table.into_iden(),
                Acometidas::Table.into_iden(),
                Dr::Table.into_iden(),
                Operadores::Table.into_iden(),
                Tecnicos::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Tecnicos {
        Table,
        IdUnicoTecnico,
        Nombre,
        Apellido,
        IdTecnico,
    }

    #[derive(DeriveIden)]
    enum Operadores {
        Table,
        IdOpe,
        NombreOperador,
    }

    #[derive(DeriveIden)]
    enum Dr {
        Table,
        IdDr,
        NombreDr,
        ValorDr,
        ValorDrEmpresa,
    }

    #[derive(DeriveIden)]
    enum Acometidas {
        Table,
        IdAcometida,
        NombreAcometida,
        Precio,
    }

    #[derive(DeriveIden)]
    enum Tipodeordenes {
        Table,
        IdTipoOrden,
        NombreOrden,
        ValorOrden,
        ValorOrdenEmpresa,
    }
}

mod m20240101_000002_create_productos_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_productos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Productos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Productos::IdProducto)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Productos::Categoria)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Productos::NombreProducto)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Productos::ProductoSerie)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Productos::Cantidad).integer().not_null())
                        .col(ColumnDef::new(Productos::IdTecnico).integer().not_null())
                        .col(
                            ColumnDef::new(Productos::FechaAsignacion)
                                .date()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_productos_id_tecnico")
                                .from(Productos::Table, Productos::IdTecnico)
                                .to(Tecnicos::Table, Tecnicos::IdUnicoTecnico)
                                .on_delete(ForeignKeyAction::NoAction)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_productos_id_tecnico")
                        .table(Productos::Table)
                        .col(Productos::IdTecnico)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Productos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Productos {
        Table,
        IdProducto,
        Categoria,
        NombreProducto,
        ProductoSerie,
        Cantidad,
        IdTecnico,
        FechaAsignacion,
    }

    #[derive(DeriveIden)]
    enum Tecnicos {
        Table,
        IdUnicoTecnico,
    }
}

mod m20240101_000003_create_instalaciones_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_instalaciones_table"
        }
    }

    // Generated columns may not reference each other on PostgreSQL, so the
    // shared amount repeats the base sum instead of reading `total`.
    const TOTAL_EXPR: &str =
        "GENERATED ALWAYS AS (valor_dr + valor_orden + COALESCE(valor_anadido, 0)) STORED";
    const COMPARTIDA_EXPR: &str =
        "GENERATED ALWAYS AS ((valor_dr + valor_orden + COALESCE(valor_anadido, 0)) / 2) STORED";
    const TOTAL_EMPRESA_EXPR: &str = "GENERATED ALWAYS AS \
         (valor_dr_empresa + valor_orden_empresa + COALESCE(valor_opcional_empresa, 0)) STORED";

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Instalaciones::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Instalaciones::IdInstalacion)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::FechaInstalacion)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::IdTecnico)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::IdOperador)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Instalaciones::Direccion).text().not_null())
                        .col(
                            ColumnDef::new(Instalaciones::NumeroOt)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::ProductoSerie)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Instalaciones::IdDr).integer().not_null())
                        .col(
                            ColumnDef::new(Instalaciones::EqReutilizado)
                                .string_len(100)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::EqRetirado)
                                .string_len(100)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::IdTipoOrden)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::MetrosCable)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::IdAcometida)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Instalaciones::Observaciones).text().null())
                        .col(
                            ColumnDef::new(Instalaciones::ValorAnadido)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::ValorOpcionalEmpresa)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::ValorDr)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::ValorOrden)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::ValorOrdenEmpresa)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::ValorDrEmpresa)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::SerieDr)
                                .string_len(100)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::Categoria)
                                .string_len(100)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::Total)
                                .decimal_len(10, 2)
                                .extra(TOTAL_EXPR),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::InstalacionCompartida)
                                .decimal_len(10, 2)
                                .extra(COMPARTIDA_EXPR),
                        )
                        .col(
                            ColumnDef::new(Instalaciones::ValorTotalEmpresa)
                                .decimal_len(10, 2)
                                .extra(TOTAL_EMPRESA_EXPR),
                        )
                        // NO ACTION: SQLite reports RESTRICT violations with an extended
                        // code that is not classified as a foreign key error.
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_instalaciones_id_tecnico")
                                .from(Instalaciones::Table, Instalaciones::IdTecnico)
                                .to(Tecnicos::Table, Tecnicos::IdUnicoTecnico)
                                .on_delete(ForeignKeyAction::NoAction),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_instalaciones_id_operador")
                                .from(Instalaciones::Table, Instalaciones::IdOperador)
                                .to(Operadores::Table, Operadores::IdOpe)
                                .on_delete(ForeignKeyAction::NoAction),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_instalaciones_producto_serie")
                                .from(Instalaciones::Table, Instalaciones::ProductoSerie)
                                .to(Productos::Table, Productos::ProductoSerie)
                                .on_delete(ForeignKeyAction::NoAction)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_instalaciones_id_dr")
                                .from(Instalaciones::Table, Instalaciones::IdDr)
                                .to(Dr::Table, Dr::IdDr)
                                .on_delete(ForeignKeyAction::NoAction),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_instalaciones_id_tipo_orden")
                                .from(Instalaciones::Table, Instalaciones::IdTipoOrden)
                                .to(Tipodeordenes::Table, Tipodeordenes::IdTipoOrden)
                                .on_delete(ForeignKeyAction::NoAction),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_instalaciones_id_acometida")
                                .from(Instalaciones::Table, Instalaciones::IdAcometida)
                                .to(Acometidas::Table, Acometidas::IdAcometida)
                                .on_delete(ForeignKeyAction::NoAction),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, column) in [
                ("idx_instalaciones_fecha", Instalaciones::FechaInstalacion),
                ("idx_instalaciones_id_tecnico", Instalaciones::IdTecnico),
                ("idx_instalaciones_id_operador", Instalaciones::IdOperador),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Instalaciones::Table)
                            .col(column)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Instalaciones::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Instalaciones {
        Table,
        IdInstalacion,
        FechaInstalacion,
        IdTecnico,
        IdOperador,
        Direccion,
        NumeroOt,
        ProductoSerie,
        IdDr,
        EqReutilizado,
        EqRetirado,
        IdTipoOrden,
        MetrosCable,
        IdAcometida,
        Observaciones,
        ValorAnadido,
        ValorOpcionalEmpresa,
        ValorDr,
        ValorOrden,
        ValorOrdenEmpresa,
        ValorDrEmpresa,
        SerieDr,
        Categoria,
        Total,
        InstalacionCompartida,
        ValorTotalEmpresa,
    }

    #[derive(DeriveIden)]
    enum Tecnicos {
        Table,
        IdUnicoTecnico,
    }

    #[derive(DeriveIden)]
    enum Operadores {
        Table,
        IdOpe,
    }

    #[derive(DeriveIden)]
    enum Productos {
        Table,
        ProductoSerie,
    }

    #[derive(DeriveIden)]
    enum Dr {
        Table,
        IdDr,
    }

    #[derive(DeriveIden)]
    enum Tipodeordenes {
        Table,
        IdTipoOrden,
    }

    #[derive(DeriveIden)]
    enum Acometidas {
        Table,
        IdAcometida,
    }
}

mod m20240101_000004_create_descuentos_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_descuentos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Descuentos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Descuentos::IdDescuento)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Descuentos::ValorDescuento)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Descuentos::IdInstalacion)
                                .integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_descuentos_id_instalacion")
                                .from(Descuentos::Table, Descuentos::IdInstalacion)
                                .to(Instalaciones::Table, Instalaciones::IdInstalacion)
                                .on_delete(ForeignKeyAction::NoAction),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Descuentos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Descuentos {
        Table,
        IdDescuento,
        ValorDescuento,
        IdInstalacion,
    }

    #[derive(DeriveIden)]
    enum Instalaciones {
        Table,
        IdInstalacion,
    }
}

mod m20240101_000005_create_auth_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_auth_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Username)
                                .string_len(150)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::DateJoined)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AuthTokens::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AuthTokens::Key)
                                .string_len(40)
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(AuthTokens::UserId)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(AuthTokens::Created)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_auth_tokens_user_id")
                                .from(AuthTokens::Table, AuthTokens::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        IsActive,
        DateJoined,
    }

    #[derive(DeriveIden)]
    enum AuthTokens {
        Table,
        Key,
        UserId,
        Created,
    }
}
