use sqlx::SqlitePool;

// Applied at startup; every statement is idempotent. The partial unique
// indexes are load-bearing: they close the duplicate-registration and
// duplicate-pending-order races at the store level, so a transaction that
// loses such a race fails on INSERT and rolls back its counter update.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
  user_id        TEXT PRIMARY KEY,
  username       TEXT NOT NULL UNIQUE,
  email          TEXT NOT NULL UNIQUE,
  password_hash  TEXT NOT NULL,
  phone          TEXT,
  role           TEXT NOT NULL DEFAULT 'user',
  real_name      TEXT,
  is_active      INTEGER NOT NULL DEFAULT 1,
  created_at     TEXT NOT NULL,
  updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activities (
  activity_id           TEXT PRIMARY KEY,
  title                 TEXT NOT NULL,
  description           TEXT NOT NULL,
  location              TEXT NOT NULL,
  category              TEXT NOT NULL,
  requirements          TEXT,
  image_url             TEXT,
  start_time            TEXT NOT NULL,
  end_time              TEXT NOT NULL,
  price                 REAL NOT NULL DEFAULT 0,
  max_participants      INTEGER NOT NULL,
  current_participants  INTEGER NOT NULL DEFAULT 0,
  status                TEXT NOT NULL DEFAULT 'active',
  creator_id            TEXT NOT NULL REFERENCES users (user_id),
  is_deleted            INTEGER NOT NULL DEFAULT 0,
  created_at            TEXT NOT NULL,
  updated_at            TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activities_creator
  ON activities (creator_id);

CREATE TABLE IF NOT EXISTS registrations (
  registration_id  TEXT PRIMARY KEY,
  user_id          TEXT NOT NULL REFERENCES users (user_id),
  activity_id      TEXT NOT NULL REFERENCES activities (activity_id),
  status           TEXT NOT NULL DEFAULT 'confirmed',
  notes            TEXT,
  created_at       TEXT NOT NULL,
  updated_at       TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS uq_registrations_confirmed
  ON registrations (user_id, activity_id)
  WHERE status = 'confirmed';

CREATE INDEX IF NOT EXISTS idx_registrations_activity
  ON registrations (activity_id);

CREATE TABLE IF NOT EXISTS orders (
  order_id        TEXT PRIMARY KEY,
  order_number    TEXT NOT NULL UNIQUE,
  user_id         TEXT NOT NULL REFERENCES users (user_id),
  activity_id     TEXT NOT NULL REFERENCES activities (activity_id),
  activity_title  TEXT NOT NULL,
  amount          REAL NOT NULL,
  status          TEXT NOT NULL DEFAULT 'pending',
  payment_status  TEXT NOT NULL DEFAULT 'pending',
  notes           TEXT,
  created_at      TEXT NOT NULL,
  updated_at      TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS uq_orders_pending
  ON orders (user_id, activity_id)
  WHERE status = 'pending';

CREATE INDEX IF NOT EXISTS idx_orders_user
  ON orders (user_id);

CREATE TABLE IF NOT EXISTS comments (
  comment_id   TEXT PRIMARY KEY,
  user_id      TEXT NOT NULL REFERENCES users (user_id),
  activity_id  TEXT NOT NULL REFERENCES activities (activity_id),
  content      TEXT NOT NULL,
  rating       INTEGER,
  created_at   TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS uq_comments_user_activity
  ON comments (user_id, activity_id);

CREATE INDEX IF NOT EXISTS idx_comments_activity
  ON comments (activity_id);
"#;

pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}
