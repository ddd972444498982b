diesel::table! {
    budgets (id) {
        id -> Uuid,
        user_id -> Uuid,
        #[max_length = 50]
        name -> Varchar,
        category -> Int2,
        #[max_length = 200]
        description -> Nullable<Varchar>,
        examples -> Nullable<Array<Text>>,
        planned_amount -> Float8,
        month -> Date,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    transactions (id) {
        id -> Uuid,
        user_id -> Uuid,
        budget_id -> Uuid,
        amount -> Float8,
        #[max_length = 100]
        description -> Varchar,
        date -> Date,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 100]
        username -> Varchar,
        #[max_length = 320]
        email -> Varchar,
        password_hash -> Text,
        is_active -> Bool,
        is_admin -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::joinable!(budgets -> users (user_id));
diesel::joinable!(transactions -> budgets (budget_id));
diesel::joinable!(transactions -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(budgets, transactions, users,);
